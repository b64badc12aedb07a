//! Board snapshot model.
//!
//! # Responsibility
//! - Hold all buckets with their ordered items in fixed display order.
//! - Answer placement queries (`locate`, `item`) for the engine.
//! - Validate ordering invariants on snapshots loaded from outside.
//!
//! # Invariants
//! - There is exactly one bucket per `TierId`, ordered like `TierId::ALL`.
//! - Every item id appears in exactly one bucket, exactly once.
//! - Positions inside a bucket are the vector indices `0..len`, so they are
//!   contiguous by construction.
//!
//! Mutation is crate-private: only `OrderStore` produces new snapshots.

use crate::model::item::{Item, ItemId, ItemValidationError};
use crate::model::tier::TierId;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Logical placement of an item: bucket plus zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Slot {
    pub tier: TierId,
    pub index: usize,
}

impl Slot {
    pub fn new(tier: TierId, index: usize) -> Self {
        Self { tier, index }
    }
}

/// Violations reported by [`Board::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardInvariantError {
    /// Board does not carry one bucket per known tier.
    BucketCount { expected: usize, found: usize },
    /// Bucket at `position` is not the tier expected by display order.
    BucketOrder {
        position: usize,
        expected: TierId,
        found: TierId,
    },
    /// Item id is referenced more than once.
    DuplicateItem(ItemId),
    /// Item attributes are invalid.
    InvalidItem {
        id: ItemId,
        reason: ItemValidationError,
    },
}

impl Display for BoardInvariantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BucketCount { expected, found } => {
                write!(f, "board must have {expected} buckets, found {found}")
            }
            Self::BucketOrder {
                position,
                expected,
                found,
            } => write!(
                f,
                "bucket at position {position} must be tier {expected}, found {found}"
            ),
            Self::DuplicateItem(id) => write!(f, "item referenced more than once: {id}"),
            Self::InvalidItem { id, reason } => write!(f, "invalid item {id}: {reason}"),
        }
    }
}

impl Error for BoardInvariantError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidItem { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// One ordered category of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    tier: TierId,
    items: Vec<Item>,
}

impl Bucket {
    fn empty(tier: TierId) -> Self {
        Self {
            tier,
            items: Vec::new(),
        }
    }

    pub fn tier(&self) -> TierId {
        self.tier
    }

    /// Items in position order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

/// Full board snapshot; the unit of persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    buckets: Vec<Bucket>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// Board with one empty bucket per known tier.
    pub fn empty() -> Self {
        Self {
            buckets: TierId::ALL.iter().copied().map(Bucket::empty).collect(),
        }
    }

    /// Builds a board from per-tier item sequences and validates it.
    ///
    /// Tiers may be given in any order and may be omitted (empty bucket).
    /// A tier given twice has its sequences concatenated in input order.
    pub fn from_buckets<I>(buckets: I) -> Result<Self, BoardInvariantError>
    where
        I: IntoIterator<Item = (TierId, Vec<Item>)>,
    {
        let mut board = Self::empty();
        for (tier, items) in buckets {
            board.buckets[tier.index()].items.extend(items);
        }
        board.validate()?;
        Ok(board)
    }

    /// Buckets in fixed display order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket(&self, tier: TierId) -> &Bucket {
        &self.buckets[tier.index()]
    }

    /// Finds the current placement of one item.
    pub fn locate(&self, id: ItemId) -> Option<Slot> {
        self.buckets.iter().find_map(|bucket| {
            bucket
                .position_of(id)
                .map(|index| Slot::new(bucket.tier, index))
        })
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.items.iter())
            .find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.locate(id).is_some()
    }

    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Bucket::is_empty)
    }

    /// All item ids in display order (bucket order, then position).
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.items.iter().map(|item| item.id))
            .collect()
    }

    /// Checks bucket layout, identity uniqueness and item attributes.
    pub fn validate(&self) -> Result<(), BoardInvariantError> {
        if self.buckets.len() != TierId::ALL.len() {
            return Err(BoardInvariantError::BucketCount {
                expected: TierId::ALL.len(),
                found: self.buckets.len(),
            });
        }

        let mut seen = HashSet::new();
        for (position, (bucket, expected)) in self.buckets.iter().zip(TierId::ALL).enumerate() {
            if bucket.tier != expected {
                return Err(BoardInvariantError::BucketOrder {
                    position,
                    expected,
                    found: bucket.tier,
                });
            }
            for item in &bucket.items {
                if !seen.insert(item.id) {
                    return Err(BoardInvariantError::DuplicateItem(item.id));
                }
                item.validate()
                    .map_err(|reason| BoardInvariantError::InvalidItem {
                        id: item.id,
                        reason,
                    })?;
            }
        }
        Ok(())
    }

    /// Copy of this board keeping only items accepted by `keep`, in order.
    pub(crate) fn retain_items(&self, mut keep: impl FnMut(&Item) -> bool) -> Board {
        Board {
            buckets: self
                .buckets
                .iter()
                .map(|bucket| Bucket {
                    tier: bucket.tier,
                    items: bucket
                        .items
                        .iter()
                        .filter(|item| keep(item))
                        .cloned()
                        .collect(),
                })
                .collect(),
        }
    }

    /// Removes the item at `slot`, compacting later positions.
    ///
    /// Callers must pass a slot obtained from `locate` on this snapshot.
    pub(crate) fn take_at(&mut self, slot: Slot) -> Item {
        self.buckets[slot.tier.index()].items.remove(slot.index)
    }

    /// Inserts `item` at `slot`, shifting later positions.
    pub(crate) fn insert_at(&mut self, slot: Slot, item: Item) {
        self.buckets[slot.tier.index()].items.insert(slot.index, item);
    }

    /// Appends `item` to the end of `tier` and returns its placement.
    pub(crate) fn push(&mut self, tier: TierId, item: Item) -> Slot {
        let bucket = &mut self.buckets[tier.index()];
        bucket.items.push(item);
        Slot::new(tier, bucket.items.len() - 1)
    }
}
