//! Input normalization: raw pointer/keyboard events to drag gestures.
//!
//! # Responsibility
//! - Turn two independent input modalities into one gesture stream
//!   (`Start`, `Move`, `Confirm`, `Cancel`).
//! - Apply the pointer activation distance so plain clicks never start drags.
//!
//! # Invariants
//! - At most one modality owns the current drag; events from the other
//!   modality are dropped, except `Escape`, which cancels any drag.
//! - Every `Start` is followed by exactly one `Confirm` or `Cancel` unless
//!   `reset()` is called.
//! - Normalization never inspects the board; it has no notion of targets.

use crate::engine::collision::{GestureSignal, KeyDirection};
use crate::engine::geometry::{Point, Rect};
use crate::model::item::ItemId;
use serde::{Deserialize, Serialize};

/// Modality that started a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureSource {
    Pointer,
    Keyboard,
}

/// Normalized drag gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Start { item: ItemId, source: GestureSource },
    Move(GestureSignal),
    Confirm,
    Cancel,
}

/// Raw pointer event as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed on an item card whose current rectangle is `item_rect`.
    Down {
        item: ItemId,
        at: Point,
        item_rect: Rect,
    },
    Move { at: Point },
    Up { at: Point },
    /// Host aborted the pointer stream (focus loss, capture lost).
    Cancel,
}

/// Keys the board reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    Space,
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// Raw key press plus the item holding keyboard focus, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub focused: Option<ItemId>,
}

impl KeyEvent {
    pub fn new(code: KeyCode, focused: Option<ItemId>) -> Self {
        Self { code, focused }
    }
}

/// Raw input from either modality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    Pointer(PointerEvent),
    Keyboard(KeyEvent),
}

/// One concrete input modality feeding the normalized gesture stream.
pub trait GestureProducer {
    type Event;

    /// Consumes one raw event and appends resulting gestures to `out`.
    fn feed(&mut self, event: Self::Event, out: &mut Vec<Gesture>);

    /// True while this producer owns an active drag.
    fn is_dragging(&self) -> bool;

    /// Drops all tracking state without emitting gestures.
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerPhase {
    Idle,
    /// Button is down but the activation distance is not reached yet.
    Pending {
        item: ItemId,
        origin: Point,
        item_rect: Rect,
    },
    Dragging {
        origin: Point,
        item_rect: Rect,
    },
}

/// Pointer producer: press, travel past the activation distance, release.
#[derive(Debug, Clone)]
pub struct PointerProducer {
    activation_distance: f64,
    phase: PointerPhase,
}

impl PointerProducer {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            phase: PointerPhase::Idle,
        }
    }

    fn dragged_rect(origin: Point, item_rect: Rect, at: Point) -> Rect {
        item_rect.translate(at.x - origin.x, at.y - origin.y)
    }
}

impl GestureProducer for PointerProducer {
    type Event = PointerEvent;

    fn feed(&mut self, event: PointerEvent, out: &mut Vec<Gesture>) {
        match (self.phase, event) {
            (
                PointerPhase::Idle,
                PointerEvent::Down {
                    item,
                    at,
                    item_rect,
                },
            ) => {
                self.phase = PointerPhase::Pending {
                    item,
                    origin: at,
                    item_rect,
                };
            }
            (
                PointerPhase::Pending {
                    item,
                    origin,
                    item_rect,
                },
                PointerEvent::Move { at },
            ) => {
                if origin.distance_to(at) >= self.activation_distance {
                    self.phase = PointerPhase::Dragging { origin, item_rect };
                    out.push(Gesture::Start {
                        item,
                        source: GestureSource::Pointer,
                    });
                    out.push(Gesture::Move(GestureSignal::Pointer(Self::dragged_rect(
                        origin, item_rect, at,
                    ))));
                }
            }
            (PointerPhase::Dragging { origin, item_rect }, PointerEvent::Move { at }) => {
                out.push(Gesture::Move(GestureSignal::Pointer(Self::dragged_rect(
                    origin, item_rect, at,
                ))));
            }
            (PointerPhase::Dragging { origin, item_rect }, PointerEvent::Up { at }) => {
                self.phase = PointerPhase::Idle;
                out.push(Gesture::Move(GestureSignal::Pointer(Self::dragged_rect(
                    origin, item_rect, at,
                ))));
                out.push(Gesture::Confirm);
            }
            (PointerPhase::Dragging { .. }, PointerEvent::Cancel) => {
                self.phase = PointerPhase::Idle;
                out.push(Gesture::Cancel);
            }
            (PointerPhase::Pending { .. }, PointerEvent::Up { .. } | PointerEvent::Cancel) => {
                // Released before activation: a click, not a drag.
                self.phase = PointerPhase::Idle;
            }
            _ => {}
        }
    }

    fn is_dragging(&self) -> bool {
        matches!(self.phase, PointerPhase::Dragging { .. })
    }

    fn reset(&mut self) {
        self.phase = PointerPhase::Idle;
    }
}

/// Keyboard producer: activate on the focused item, step, confirm or escape.
#[derive(Debug, Clone, Default)]
pub struct KeyboardProducer {
    dragging: bool,
}

impl KeyboardProducer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GestureProducer for KeyboardProducer {
    type Event = KeyEvent;

    fn feed(&mut self, event: KeyEvent, out: &mut Vec<Gesture>) {
        match event.code {
            KeyCode::Space | KeyCode::Enter => {
                if self.dragging {
                    self.dragging = false;
                    out.push(Gesture::Confirm);
                } else if let Some(item) = event.focused {
                    self.dragging = true;
                    out.push(Gesture::Start {
                        item,
                        source: GestureSource::Keyboard,
                    });
                }
            }
            KeyCode::Escape => {
                if self.dragging {
                    self.dragging = false;
                    out.push(Gesture::Cancel);
                }
            }
            KeyCode::ArrowUp | KeyCode::ArrowDown | KeyCode::ArrowLeft | KeyCode::ArrowRight => {
                if self.dragging {
                    out.push(Gesture::Move(GestureSignal::Keyboard(direction_for(
                        event.code,
                    ))));
                }
            }
        }
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn reset(&mut self) {
        self.dragging = false;
    }
}

fn direction_for(code: KeyCode) -> KeyDirection {
    match code {
        KeyCode::ArrowUp => KeyDirection::Previous,
        KeyCode::ArrowDown => KeyDirection::Next,
        KeyCode::ArrowLeft => KeyDirection::PreviousBucket,
        _ => KeyDirection::NextBucket,
    }
}

/// Routes raw input to the owning producer and merges their gestures.
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    pointer: PointerProducer,
    keyboard: KeyboardProducer,
}

impl InputNormalizer {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            pointer: PointerProducer::new(activation_distance),
            keyboard: KeyboardProducer::new(),
        }
    }

    /// Normalizes one raw event into zero or more gestures.
    pub fn normalize(&mut self, input: RawInput) -> Vec<Gesture> {
        let mut out = Vec::new();
        match input {
            RawInput::Pointer(event) => {
                if !self.keyboard.is_dragging() {
                    self.pointer.feed(event, &mut out);
                }
            }
            RawInput::Keyboard(event) => {
                if self.pointer.is_dragging() {
                    if event.code == KeyCode::Escape {
                        self.pointer.reset();
                        out.push(Gesture::Cancel);
                    }
                } else {
                    // A key press aborts a pointer press that never activated.
                    self.pointer.reset();
                    self.keyboard.feed(event, &mut out);
                }
            }
        }
        out
    }

    /// Modality owning the current drag, if any.
    pub fn active_source(&self) -> Option<GestureSource> {
        if self.pointer.is_dragging() {
            Some(GestureSource::Pointer)
        } else if self.keyboard.is_dragging() {
            Some(GestureSource::Keyboard)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.pointer.reset();
        self.keyboard.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Gesture, GestureSource, InputNormalizer, KeyCode, KeyEvent, PointerEvent, RawInput,
    };
    use crate::engine::collision::{GestureSignal, KeyDirection};
    use crate::engine::geometry::{Point, Rect};
    use uuid::Uuid;

    fn down(item: Uuid, x: f64, y: f64) -> RawInput {
        RawInput::Pointer(PointerEvent::Down {
            item,
            at: Point::new(x, y),
            item_rect: Rect::new(0.0, 0.0, 100.0, 20.0),
        })
    }

    fn moved(x: f64, y: f64) -> RawInput {
        RawInput::Pointer(PointerEvent::Move {
            at: Point::new(x, y),
        })
    }

    fn up(x: f64, y: f64) -> RawInput {
        RawInput::Pointer(PointerEvent::Up {
            at: Point::new(x, y),
        })
    }

    fn key(code: KeyCode, focused: Option<Uuid>) -> RawInput {
        RawInput::Keyboard(KeyEvent::new(code, focused))
    }

    #[test]
    fn pointer_drag_starts_after_activation_distance() {
        let item = Uuid::new_v4();
        let mut normalizer = InputNormalizer::new(5.0);

        assert!(normalizer.normalize(down(item, 10.0, 10.0)).is_empty());
        assert!(normalizer.normalize(moved(12.0, 11.0)).is_empty());

        let gestures = normalizer.normalize(moved(10.0, 30.0));
        assert_eq!(
            gestures,
            vec![
                Gesture::Start {
                    item,
                    source: GestureSource::Pointer
                },
                Gesture::Move(GestureSignal::Pointer(Rect::new(0.0, 20.0, 100.0, 20.0))),
            ]
        );
        assert_eq!(normalizer.active_source(), Some(GestureSource::Pointer));

        let gestures = normalizer.normalize(up(10.0, 40.0));
        assert_eq!(
            gestures,
            vec![
                Gesture::Move(GestureSignal::Pointer(Rect::new(0.0, 30.0, 100.0, 20.0))),
                Gesture::Confirm,
            ]
        );
        assert_eq!(normalizer.active_source(), None);
    }

    #[test]
    fn pointer_click_without_travel_emits_nothing() {
        let item = Uuid::new_v4();
        let mut normalizer = InputNormalizer::new(5.0);

        assert!(normalizer.normalize(down(item, 10.0, 10.0)).is_empty());
        assert!(normalizer.normalize(up(11.0, 10.0)).is_empty());
        assert!(normalizer.normalize(moved(50.0, 50.0)).is_empty());
    }

    #[test]
    fn escape_cancels_pointer_drag_and_ignores_other_keys() {
        let item = Uuid::new_v4();
        let mut normalizer = InputNormalizer::new(0.0);
        normalizer.normalize(down(item, 0.0, 0.0));
        normalizer.normalize(moved(0.0, 10.0));

        assert!(normalizer
            .normalize(key(KeyCode::ArrowDown, Some(item)))
            .is_empty());
        assert_eq!(
            normalizer.normalize(key(KeyCode::Escape, None)),
            vec![Gesture::Cancel]
        );
        assert_eq!(normalizer.active_source(), None);
        assert!(normalizer.normalize(up(0.0, 10.0)).is_empty());
    }

    #[test]
    fn keyboard_activate_step_confirm() {
        let item = Uuid::new_v4();
        let mut normalizer = InputNormalizer::new(5.0);

        assert!(normalizer.normalize(key(KeyCode::ArrowDown, Some(item))).is_empty());
        assert_eq!(
            normalizer.normalize(key(KeyCode::Space, Some(item))),
            vec![Gesture::Start {
                item,
                source: GestureSource::Keyboard
            }]
        );
        assert_eq!(
            normalizer.normalize(key(KeyCode::ArrowDown, Some(item))),
            vec![Gesture::Move(GestureSignal::Keyboard(KeyDirection::Next))]
        );
        assert_eq!(
            normalizer.normalize(key(KeyCode::ArrowLeft, Some(item))),
            vec![Gesture::Move(GestureSignal::Keyboard(
                KeyDirection::PreviousBucket
            ))]
        );
        assert_eq!(
            normalizer.normalize(key(KeyCode::Enter, Some(item))),
            vec![Gesture::Confirm]
        );
        assert_eq!(normalizer.active_source(), None);
    }

    #[test]
    fn keyboard_drag_ignores_pointer_events() {
        let item = Uuid::new_v4();
        let mut normalizer = InputNormalizer::new(0.0);
        normalizer.normalize(key(KeyCode::Enter, Some(item)));

        assert!(normalizer.normalize(down(item, 0.0, 0.0)).is_empty());
        assert!(normalizer.normalize(moved(0.0, 50.0)).is_empty());
        assert_eq!(
            normalizer.normalize(key(KeyCode::Escape, Some(item))),
            vec![Gesture::Cancel]
        );
    }

    #[test]
    fn activate_without_focus_is_ignored() {
        let mut normalizer = InputNormalizer::new(5.0);
        assert!(normalizer.normalize(key(KeyCode::Space, None)).is_empty());
        assert_eq!(normalizer.active_source(), None);
    }
}
