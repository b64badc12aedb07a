//! Drag session state machine.
//!
//! # Responsibility
//! - Track the single in-progress drag: active item, origin slot and the
//!   candidate target ("what would happen if dropped now").
//! - Commit the candidate through `OrderStore::apply_move`, or revert to the
//!   checkpoint taken at drag start.
//!
//! # Invariants
//! - At most one session is active; `start` while active is a no-op.
//! - `update` never mutates the store.
//! - `confirm` and `cancel` always leave the session `Idle`.
//! - A cancelled drag leaves the store snapshot equal to the checkpoint.

use crate::engine::collision::{resolve_keyboard, resolve_pointer, DropTarget, GestureSignal};
use crate::engine::geometry::BoardLayout;
use crate::engine::input::GestureSource;
use crate::engine::order_store::{OrderStore, StoreCheckpoint, StoreResult};
use crate::model::board::Slot;
use crate::model::item::ItemId;
use log::{debug, info};

/// Lifecycle state of the drag session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    /// Drag in progress without a resolvable drop target.
    Dragging {
        active: ItemId,
        source: GestureSource,
        origin: Slot,
    },
    /// Drag in progress with a candidate drop target.
    Previewing {
        active: ItemId,
        source: GestureSource,
        origin: Slot,
        candidate: DropTarget,
    },
}

/// Why a drag ended without a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Dropped while no valid target was under the gesture.
    NoValidTarget,
    /// Explicit cancel (Escape, host abort).
    Explicit,
}

/// Move applied by a committed drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedMove {
    pub item: ItemId,
    pub from: Slot,
    pub to: Slot,
}

impl CommittedMove {
    /// False when the item was dropped back onto its own slot.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Terminal result of a gesture end or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// No session was active.
    Idle,
    Committed(CommittedMove),
    Cancelled { item: ItemId, reason: CancelReason },
}

/// Single-drag state machine; the state itself is the exclusivity lock.
#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    checkpoint: Option<StoreCheckpoint>,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DragSession {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            checkpoint: None,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn active_item(&self) -> Option<ItemId> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { active, .. } | DragState::Previewing { active, .. } => {
                Some(active)
            }
        }
    }

    /// Current candidate target, if any.
    pub fn preview(&self) -> Option<DropTarget> {
        match self.state {
            DragState::Previewing { candidate, .. } => Some(candidate),
            _ => None,
        }
    }

    /// Starts a drag of `item`.
    ///
    /// Returns `false` (and changes nothing) when a drag is already active or
    /// the item is not on the board.
    pub fn start(&mut self, item: ItemId, source: GestureSource, store: &OrderStore) -> bool {
        if self.is_active() {
            debug!("event=drag_start module=session status=ignored reason=session_active");
            return false;
        }
        let Some(origin) = store.board().locate(item) else {
            debug!("event=drag_start module=session status=ignored reason=unknown_item");
            return false;
        };

        self.checkpoint = Some(store.checkpoint());
        self.state = DragState::Dragging {
            active: item,
            source,
            origin,
        };
        debug!(
            "event=drag_start module=session status=ok source={:?} origin={}:{}",
            source, origin.tier, origin.index
        );
        true
    }

    /// Re-resolves the candidate target for a new gesture signal.
    ///
    /// A pointer signal with no target drops the candidate; a keyboard step
    /// that cannot move keeps it. Returns the resulting preview.
    pub fn update(
        &mut self,
        signal: &GestureSignal,
        store: &OrderStore,
        layout: &BoardLayout,
    ) -> Option<DropTarget> {
        let (active, source, origin, candidate) = match self.state {
            DragState::Idle => return None,
            DragState::Dragging {
                active,
                source,
                origin,
            } => (active, source, origin, None),
            DragState::Previewing {
                active,
                source,
                origin,
                candidate,
            } => (active, source, origin, Some(candidate)),
        };

        let resolved = match signal {
            GestureSignal::Pointer(rect) => resolve_pointer(store.board(), layout, active, *rect),
            GestureSignal::Keyboard(direction) => {
                let from = candidate.unwrap_or(origin);
                resolve_keyboard(store.board(), active, from, *direction).or(candidate)
            }
        };

        self.state = match resolved {
            Some(candidate) => DragState::Previewing {
                active,
                source,
                origin,
                candidate,
            },
            None => DragState::Dragging {
                active,
                source,
                origin,
            },
        };
        resolved
    }

    /// Ends the drag: commits the candidate, or cancels when there is none.
    ///
    /// # Errors
    /// - Propagates `StoreError` from `apply_move`; the store is reverted to
    ///   the checkpoint and the session is `Idle` afterwards.
    pub fn confirm(&mut self, store: &mut OrderStore) -> StoreResult<DragOutcome> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let checkpoint = self.checkpoint.take();

        match state {
            DragState::Idle => Ok(DragOutcome::Idle),
            DragState::Dragging { active, .. } => {
                restore(store, checkpoint.as_ref());
                debug!("event=drag_end module=session status=cancelled reason=no_valid_target");
                Ok(DragOutcome::Cancelled {
                    item: active,
                    reason: CancelReason::NoValidTarget,
                })
            }
            DragState::Previewing {
                active,
                origin,
                candidate,
                ..
            } => match store.apply_move(active, candidate.tier, candidate.index) {
                Ok(_) => {
                    info!(
                        "event=drag_end module=session status=committed from={}:{} to={}:{}",
                        origin.tier, origin.index, candidate.tier, candidate.index
                    );
                    Ok(DragOutcome::Committed(CommittedMove {
                        item: active,
                        from: origin,
                        to: candidate,
                    }))
                }
                Err(err) => {
                    restore(store, checkpoint.as_ref());
                    Err(err)
                }
            },
        }
    }

    /// Cancels the drag explicitly; no-op when idle.
    pub fn cancel(&mut self, store: &mut OrderStore) -> DragOutcome {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let checkpoint = self.checkpoint.take();

        match state {
            DragState::Idle => DragOutcome::Idle,
            DragState::Dragging { active, .. } | DragState::Previewing { active, .. } => {
                restore(store, checkpoint.as_ref());
                debug!("event=drag_end module=session status=cancelled reason=explicit");
                DragOutcome::Cancelled {
                    item: active,
                    reason: CancelReason::Explicit,
                }
            }
        }
    }
}

fn restore(store: &mut OrderStore, checkpoint: Option<&StoreCheckpoint>) {
    if let Some(checkpoint) = checkpoint {
        store.revert(checkpoint);
    }
}
