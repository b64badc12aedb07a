//! Authoritative ordered-bucket store.
//!
//! # Responsibility
//! - Own the current board snapshot and its revision counter.
//! - Apply moves, insertions and removals atomically.
//! - Revert to a checkpoint captured before a drag.
//!
//! # Invariants
//! - Every operation builds the next board off to the side, validates it and
//!   swaps it in with one assignment; failed operations leave the store as is.
//! - `revision` increases by one on every snapshot replacement.
//! - Snapshots handed out are immutable (`Arc<Board>`).

use crate::model::board::{Board, BoardInvariantError, Slot};
use crate::model::item::{Item, ItemId};
use crate::model::tier::TierId;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Precondition violations of `apply_move`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidMove {
    /// Item is not on the board.
    UnknownItem(ItemId),
    /// Destination index is outside `0..limit`.
    IndexOutOfRange {
        tier: TierId,
        index: usize,
        limit: usize,
    },
}

impl Display for InvalidMove {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownItem(id) => write!(f, "item is not on the board: {id}"),
            Self::IndexOutOfRange { tier, index, limit } => write!(
                f,
                "destination index {index} out of range for tier {tier} (must be < {limit})"
            ),
        }
    }
}

impl Error for InvalidMove {}

/// Errors from order store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `apply_move` precondition violated; caller or internal logic fault.
    InvalidMove(InvalidMove),
    /// Inserted item id already exists on the board.
    DuplicateItem(ItemId),
    /// Removed item id does not exist on the board.
    ItemNotFound(ItemId),
    /// Candidate snapshot failed validation; nothing was applied.
    Invariant(BoardInvariantError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMove(err) => write!(f, "invalid move: {err}"),
            Self::DuplicateItem(id) => write!(f, "item already on the board: {id}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::Invariant(err) => write!(f, "board invariant violated: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMove(err) => Some(err),
            Self::Invariant(err) => Some(err),
            Self::DuplicateItem(_) | Self::ItemNotFound(_) => None,
        }
    }
}

impl From<InvalidMove> for StoreError {
    fn from(value: InvalidMove) -> Self {
        Self::InvalidMove(value)
    }
}

impl From<BoardInvariantError> for StoreError {
    fn from(value: BoardInvariantError) -> Self {
        Self::Invariant(value)
    }
}

/// Snapshot captured at drag start, used to revert on cancel.
#[derive(Debug, Clone)]
pub struct StoreCheckpoint {
    revision: u64,
    snapshot: Arc<Board>,
}

impl StoreCheckpoint {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> &Board {
        &self.snapshot
    }
}

/// Ordered-bucket store with atomic snapshot replacement.
#[derive(Debug, Clone)]
pub struct OrderStore {
    snapshot: Arc<Board>,
    revision: u64,
}

impl OrderStore {
    /// Creates a store from an already-validated board.
    pub fn new(board: Board) -> StoreResult<Self> {
        board.validate()?;
        Ok(Self {
            snapshot: Arc::new(board),
            revision: 0,
        })
    }

    /// Current committed snapshot.
    pub fn snapshot(&self) -> Arc<Board> {
        Arc::clone(&self.snapshot)
    }

    /// Borrowed view of the current snapshot.
    pub fn board(&self) -> &Board {
        &self.snapshot
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Moves `item` so that it ends at `index` in `tier`.
    ///
    /// `index` is the final position, so it must be `< len(tier)` when the
    /// item already lives in `tier` and `<= len(tier)` otherwise.
    ///
    /// Moving an item onto its own slot succeeds without a new revision.
    ///
    /// # Errors
    /// - `StoreError::InvalidMove` when the item is unknown or the index is
    ///   out of range; the store is left untouched.
    pub fn apply_move(&mut self, item: ItemId, tier: TierId, index: usize) -> StoreResult<Arc<Board>> {
        let source = self
            .snapshot
            .locate(item)
            .ok_or(InvalidMove::UnknownItem(item))?;
        let destination_len = self.snapshot.bucket(tier).len();
        let limit = if source.tier == tier {
            destination_len
        } else {
            destination_len + 1
        };
        if index >= limit {
            return Err(InvalidMove::IndexOutOfRange { tier, index, limit }.into());
        }

        let destination = Slot::new(tier, index);
        if destination == source {
            debug!(
                "event=store_apply_move module=store status=noop tier={} index={}",
                tier, index
            );
            return Ok(self.snapshot());
        }

        let mut next = Board::clone(&self.snapshot);
        let moved = next.take_at(source);
        next.insert_at(destination, moved);
        self.replace(next)?;

        debug!(
            "event=store_apply_move module=store status=ok from={}:{} to={}:{} revision={}",
            source.tier, source.index, tier, index, self.revision
        );
        Ok(self.snapshot())
    }

    /// Appends a new item at the end of `tier`.
    pub fn insert_item(&mut self, item: Item, tier: TierId) -> StoreResult<Slot> {
        if self.snapshot.contains(item.id) {
            return Err(StoreError::DuplicateItem(item.id));
        }

        let mut next = Board::clone(&self.snapshot);
        let slot = next.push(tier, item);
        self.replace(next)?;
        Ok(slot)
    }

    /// Removes one item, compacting positions after it.
    pub fn remove_item(&mut self, id: ItemId) -> StoreResult<Item> {
        let slot = self
            .snapshot
            .locate(id)
            .ok_or(StoreError::ItemNotFound(id))?;

        let mut next = Board::clone(&self.snapshot);
        let removed = next.take_at(slot);
        self.replace(next)?;
        Ok(removed)
    }

    /// Captures the current snapshot for a later `revert`.
    pub fn checkpoint(&self) -> StoreCheckpoint {
        StoreCheckpoint {
            revision: self.revision,
            snapshot: self.snapshot(),
        }
    }

    /// Restores `checkpoint` as the current snapshot.
    ///
    /// Returns `false` when nothing changed since the checkpoint; the store
    /// is then left exactly as it is.
    pub fn revert(&mut self, checkpoint: &StoreCheckpoint) -> bool {
        if checkpoint.revision == self.revision {
            return false;
        }

        warn!(
            "event=store_revert module=store status=ok from_revision={} to_revision={}",
            self.revision, checkpoint.revision
        );
        self.snapshot = Arc::clone(&checkpoint.snapshot);
        self.revision += 1;
        true
    }

    fn replace(&mut self, next: Board) -> StoreResult<()> {
        next.validate()?;
        self.snapshot = Arc::new(next);
        self.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidMove, OrderStore, StoreError};
    use crate::model::board::{Board, Slot};
    use crate::model::item::{Item, ItemDraft};
    use crate::model::tier::TierId;

    fn item(title: &str) -> Item {
        Item::from_draft(ItemDraft::new(title)).unwrap()
    }

    fn three_item_store() -> (OrderStore, Item, Item, Item) {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let board = Board::from_buckets([
            (TierId::S, vec![a.clone(), b.clone()]),
            (TierId::A, vec![c.clone()]),
        ])
        .unwrap();
        (OrderStore::new(board).unwrap(), a, b, c)
    }

    #[test]
    fn apply_move_across_buckets() {
        let (mut store, a, b, c) = three_item_store();

        let board = store.apply_move(b.id, TierId::A, 0).unwrap();
        assert_eq!(board.bucket(TierId::S).item_ids(), vec![a.id]);
        assert_eq!(board.bucket(TierId::A).item_ids(), vec![b.id, c.id]);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn apply_move_within_bucket_uses_final_position() {
        let (mut store, a, b, _) = three_item_store();

        let board = store.apply_move(a.id, TierId::S, 1).unwrap();
        assert_eq!(board.bucket(TierId::S).item_ids(), vec![b.id, a.id]);
    }

    #[test]
    fn apply_move_onto_own_slot_keeps_revision() {
        let (mut store, _, b, _) = three_item_store();
        let before = store.snapshot();

        let after = store.apply_move(b.id, TierId::S, 1).unwrap();
        assert_eq!(*after, *before);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn apply_move_rejects_out_of_range_index_without_mutation() {
        let (mut store, a, _, _) = three_item_store();
        let before = store.snapshot();

        let same_bucket = store.apply_move(a.id, TierId::S, 2).unwrap_err();
        assert_eq!(
            same_bucket,
            StoreError::InvalidMove(InvalidMove::IndexOutOfRange {
                tier: TierId::S,
                index: 2,
                limit: 2
            })
        );

        let other_bucket = store.apply_move(a.id, TierId::A, 2).unwrap_err();
        assert!(matches!(
            other_bucket,
            StoreError::InvalidMove(InvalidMove::IndexOutOfRange { limit: 2, .. })
        ));

        assert_eq!(*store.snapshot(), *before);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn apply_move_rejects_unknown_item() {
        let (mut store, _, _, _) = three_item_store();
        let stranger = item("stranger");

        let err = store.apply_move(stranger.id, TierId::S, 0).unwrap_err();
        assert_eq!(err, StoreError::InvalidMove(InvalidMove::UnknownItem(stranger.id)));
    }

    #[test]
    fn insert_and_remove_keep_positions_contiguous() {
        let (mut store, a, b, _) = three_item_store();
        let d = item("d");

        let slot = store.insert_item(d.clone(), TierId::S).unwrap();
        assert_eq!(slot, Slot::new(TierId::S, 2));
        assert_eq!(
            store.insert_item(d.clone(), TierId::F).unwrap_err(),
            StoreError::DuplicateItem(d.id)
        );

        store.remove_item(a.id).unwrap();
        let board = store.board();
        assert_eq!(board.bucket(TierId::S).item_ids(), vec![b.id, d.id]);
        assert_eq!(board.locate(d.id), Some(Slot::new(TierId::S, 1)));
    }

    #[test]
    fn revert_restores_checkpoint_snapshot() {
        let (mut store, a, _, _) = three_item_store();
        let checkpoint = store.checkpoint();
        assert!(!store.revert(&checkpoint));

        store.apply_move(a.id, TierId::F, 0).unwrap();
        assert!(store.revert(&checkpoint));
        assert_eq!(*store.snapshot(), *checkpoint.snapshot());
        assert_eq!(store.revision(), 2);
    }
}
