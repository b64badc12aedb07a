//! Drop-target resolution for pointer and keyboard drags.
//!
//! # Responsibility
//! - Map the current gesture signal to the slot the active item would land
//!   in if dropped now.
//!
//! # Invariants
//! - Resolution is a pure function of (board, layout, active item, signal).
//! - Every returned target satisfies `OrderStore::apply_move` preconditions
//!   for the active item on the same board.
//! - `DropTarget::index` is the item's final position in the destination
//!   bucket, counted without the active item.

use crate::engine::geometry::{BoardLayout, Point, Rect};
use crate::model::board::{Board, Slot};
use crate::model::item::ItemId;
use crate::model::tier::TierId;
use serde::{Deserialize, Serialize};

/// Slot the active item would occupy after a drop.
pub type DropTarget = Slot;

/// Discrete keyboard move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDirection {
    /// One slot towards the start; crosses into the previous bucket's end.
    Previous,
    /// One slot towards the end; crosses into the next bucket's start.
    Next,
    /// Jump to the end of the previous bucket.
    PreviousBucket,
    /// Jump to the start of the next bucket.
    NextBucket,
}

/// Normalized position input for one gesture step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSignal {
    /// Dragged card rectangle, already translated by the pointer delta.
    Pointer(Rect),
    /// Arrow-style step relative to the current keyboard position.
    Keyboard(KeyDirection),
}

struct Candidate {
    distance: f64,
    target: DropTarget,
}

/// Resolves the closest drop target for a pointer-driven drag.
///
/// Candidates are item slots (the active item's own slot means "stay") and
/// the containers of buckets that show no other item in `layout`. Containers
/// of buckets with visible items are not candidates. Only buckets whose
/// container intersects `pointer` take part. Ties keep the candidate that
/// comes first in display order.
pub fn resolve_pointer(
    board: &Board,
    layout: &BoardLayout,
    active: ItemId,
    pointer: Rect,
) -> Option<DropTarget> {
    let origin = board.locate(active)?;
    let center = pointer.center();
    let mut best: Option<Candidate> = None;

    for bucket in board.buckets() {
        let Some(container) = layout.bucket_rect(bucket.tier()) else {
            continue;
        };
        if !container.intersects(&pointer) {
            continue;
        }

        // Hidden siblings have no rect; a bucket showing none of them looks
        // empty and takes the drop after them.
        let siblings = || bucket.items().iter().filter(move |item| item.id != active);
        if siblings().all(|item| layout.item_rect(item.id).is_none()) {
            consider(
                &mut best,
                center,
                container.center(),
                Slot::new(bucket.tier(), siblings().count()),
            );
        }

        let mut sibling_index = 0;
        for item in bucket.items() {
            if item.id == active {
                if let Some(rect) = layout.item_rect(item.id) {
                    consider(&mut best, center, rect.center(), origin);
                }
                continue;
            }

            if let Some(rect) = layout.item_rect(item.id) {
                let sibling_center = rect.center();
                let index = if center.y < sibling_center.y {
                    sibling_index
                } else {
                    sibling_index + 1
                };
                consider(
                    &mut best,
                    center,
                    sibling_center,
                    Slot::new(bucket.tier(), index),
                );
            }
            sibling_index += 1;
        }
    }

    best.map(|candidate| candidate.target)
}

/// Resolves the next keyboard position from `from` in `direction`.
///
/// Returns `None` when the step would leave the board (before the first
/// bucket or after the last one) or when `active` is not on the board.
pub fn resolve_keyboard(
    board: &Board,
    active: ItemId,
    from: DropTarget,
    direction: KeyDirection,
) -> Option<DropTarget> {
    board.locate(active)?;
    let sibling_len = |tier: TierId| {
        board
            .bucket(tier)
            .items()
            .iter()
            .filter(|item| item.id != active)
            .count()
    };
    let index = from.index.min(sibling_len(from.tier));

    match direction {
        KeyDirection::Next if index < sibling_len(from.tier) => {
            Some(Slot::new(from.tier, index + 1))
        }
        KeyDirection::Previous if index > 0 => Some(Slot::new(from.tier, index - 1)),
        KeyDirection::Next | KeyDirection::NextBucket => {
            from.tier.next().map(|tier| Slot::new(tier, 0))
        }
        KeyDirection::Previous | KeyDirection::PreviousBucket => from
            .tier
            .previous()
            .map(|tier| Slot::new(tier, sibling_len(tier))),
    }
}

fn consider(best: &mut Option<Candidate>, from: Point, to: Point, target: DropTarget) {
    let distance = from.distance_to(to);
    // Strictly closer only: equal distances keep the earlier candidate.
    if best
        .as_ref()
        .map_or(true, |current| distance < current.distance)
    {
        *best = Some(Candidate { distance, target });
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_keyboard, resolve_pointer, KeyDirection};
    use crate::engine::geometry::{BoardLayout, Rect};
    use crate::model::board::{Board, Slot};
    use crate::model::item::{Item, ItemDraft};
    use crate::model::tier::TierId;

    const ROW_HEIGHT: f64 = 100.0;
    const CARD_HEIGHT: f64 = 20.0;

    fn item(title: &str) -> Item {
        Item::from_draft(ItemDraft::new(title)).unwrap()
    }

    /// Stacks buckets vertically, cards vertically inside each bucket.
    fn layout_for(board: &Board) -> BoardLayout {
        let mut layout = BoardLayout::new();
        for (row, bucket) in board.buckets().iter().enumerate() {
            let top = row as f64 * ROW_HEIGHT;
            layout.set_bucket(bucket.tier(), Rect::new(0.0, top, 200.0, ROW_HEIGHT));
            for (position, item) in bucket.items().iter().enumerate() {
                layout.set_item(
                    item.id,
                    Rect::new(10.0, top + 5.0 + position as f64 * CARD_HEIGHT, 180.0, CARD_HEIGHT),
                );
            }
        }
        layout
    }

    fn card_at(top: f64) -> Rect {
        Rect::new(10.0, top, 180.0, CARD_HEIGHT)
    }

    #[test]
    fn pointer_over_sibling_upper_half_inserts_before_it() {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let board = Board::from_buckets([
            (TierId::S, vec![a.clone(), b.clone()]),
            (TierId::A, vec![c.clone()]),
        ])
        .unwrap();
        let layout = layout_for(&board);

        // c's card spans y=105..125 in bucket A; pointer centre sits just above it.
        let target = resolve_pointer(&board, &layout, b.id, card_at(104.0));
        assert_eq!(target, Some(Slot::new(TierId::A, 0)));

        let target = resolve_pointer(&board, &layout, b.id, card_at(108.0));
        assert_eq!(target, Some(Slot::new(TierId::A, 1)));
    }

    #[test]
    fn pointer_over_own_card_stays_in_place() {
        let a = item("a");
        let b = item("b");
        let board = Board::from_buckets([(TierId::S, vec![a.clone(), b.clone()])]).unwrap();
        let layout = layout_for(&board);

        let own = layout.item_rect(b.id).unwrap();
        assert_eq!(
            resolve_pointer(&board, &layout, b.id, own),
            Some(Slot::new(TierId::S, 1))
        );
    }

    #[test]
    fn pointer_over_empty_bucket_targets_its_container() {
        let a = item("a");
        let board = Board::from_buckets([(TierId::S, vec![a.clone()])]).unwrap();
        let layout = layout_for(&board);

        // Centre of bucket C's row; no cards live there.
        let target = resolve_pointer(&board, &layout, a.id, card_at(3.0 * ROW_HEIGHT + 40.0));
        assert_eq!(target, Some(Slot::new(TierId::C, 0)));
    }

    #[test]
    fn bucket_with_only_unlaid_items_appends_after_them() {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let board = Board::from_buckets([
            (TierId::S, vec![a.clone()]),
            (TierId::A, vec![b.clone(), c.clone()]),
        ])
        .unwrap();
        let visible = Board::from_buckets([(TierId::S, vec![a.clone()])]).unwrap();
        let layout = layout_for(&visible);

        let target = resolve_pointer(&board, &layout, a.id, card_at(ROW_HEIGHT + 40.0));
        assert_eq!(target, Some(Slot::new(TierId::A, 2)));
    }

    #[test]
    fn pointer_outside_every_bucket_has_no_target() {
        let a = item("a");
        let b = item("b");
        let board = Board::from_buckets([(TierId::S, vec![a.clone(), b.clone()])]).unwrap();
        let layout = layout_for(&board);

        assert_eq!(
            resolve_pointer(&board, &layout, a.id, Rect::new(500.0, 500.0, 180.0, 20.0)),
            None
        );
        assert_eq!(
            resolve_pointer(&board, &layout, a.id, card_at(-500.0)),
            None
        );
    }

    #[test]
    fn pointer_ties_prefer_first_in_display_order() {
        let a = item("a");
        let board = Board::from_buckets([(TierId::B, vec![a.clone()])]).unwrap();
        let layout = BoardLayout::new()
            .with_bucket(TierId::S, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_bucket(TierId::A, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_bucket(TierId::B, Rect::new(0.0, 200.0, 100.0, 100.0))
            .with_item(a.id, Rect::new(0.0, 200.0, 100.0, 20.0));

        let target = resolve_pointer(&board, &layout, a.id, Rect::new(25.0, 25.0, 50.0, 50.0));
        assert_eq!(target, Some(Slot::new(TierId::S, 0)));
    }

    #[test]
    fn pointer_resolution_is_repeatable() {
        let items: Vec<Item> = (0..4).map(|n| item(&format!("card {n}"))).collect();
        let board = Board::from_buckets([(TierId::D, items.clone())]).unwrap();
        let layout = layout_for(&board);
        let pointer = card_at(4.0 * ROW_HEIGHT + 31.0);

        let first = resolve_pointer(&board, &layout, items[0].id, pointer);
        for _ in 0..10 {
            assert_eq!(resolve_pointer(&board, &layout, items[0].id, pointer), first);
        }
    }

    #[test]
    fn keyboard_steps_within_bucket_then_crosses_boundary() {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let board = Board::from_buckets([
            (TierId::S, vec![a.clone(), b.clone()]),
            (TierId::A, vec![c.clone()]),
        ])
        .unwrap();

        let start = board.locate(a.id).unwrap();
        let step = resolve_keyboard(&board, a.id, start, KeyDirection::Next).unwrap();
        assert_eq!(step, Slot::new(TierId::S, 1));

        let cross = resolve_keyboard(&board, a.id, step, KeyDirection::Next).unwrap();
        assert_eq!(cross, Slot::new(TierId::A, 0));

        let back = resolve_keyboard(&board, a.id, cross, KeyDirection::Previous).unwrap();
        assert_eq!(back, Slot::new(TierId::S, 1));
    }

    #[test]
    fn keyboard_next_with_no_sibling_moves_to_adjacent_bucket_start() {
        let a = item("a");
        let board = Board::from_buckets([(TierId::S, vec![a.clone()])]).unwrap();

        let start = board.locate(a.id).unwrap();
        assert_eq!(
            resolve_keyboard(&board, a.id, start, KeyDirection::Next),
            Some(Slot::new(TierId::A, 0))
        );
        assert_eq!(
            resolve_keyboard(&board, a.id, start, KeyDirection::NextBucket),
            Some(Slot::new(TierId::A, 0))
        );
    }

    #[test]
    fn keyboard_previous_bucket_lands_at_end() {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let board = Board::from_buckets([
            (TierId::S, vec![a.clone(), b.clone()]),
            (TierId::A, vec![c.clone()]),
        ])
        .unwrap();

        let start = board.locate(c.id).unwrap();
        assert_eq!(
            resolve_keyboard(&board, c.id, start, KeyDirection::PreviousBucket),
            Some(Slot::new(TierId::S, 2))
        );
    }

    #[test]
    fn keyboard_stops_at_board_edges() {
        let a = item("a");
        let z = item("z");
        let board =
            Board::from_buckets([(TierId::S, vec![a.clone()]), (TierId::F, vec![z.clone()])])
                .unwrap();

        let top = board.locate(a.id).unwrap();
        assert_eq!(resolve_keyboard(&board, a.id, top, KeyDirection::Previous), None);
        assert_eq!(
            resolve_keyboard(&board, a.id, top, KeyDirection::PreviousBucket),
            None
        );

        let bottom = board.locate(z.id).unwrap();
        assert_eq!(resolve_keyboard(&board, z.id, bottom, KeyDirection::Next), None);
    }
}
