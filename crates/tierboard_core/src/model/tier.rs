//! Tier (bucket) identifiers.
//!
//! # Responsibility
//! - Define the fixed, ordered set of category labels used by the board.
//! - Provide adjacency lookups in display order.
//!
//! # Invariants
//! - `TierId::ALL` is the display order, best tier first.
//! - `index()` and `from_index()` are inverse for every tier.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Tier assigned to new items when the caller does not choose one.
pub const DEFAULT_TIER: TierId = TierId::B;

/// Bucket identifier, ordered from best (`S`) to worst (`F`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TierId {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl TierId {
    /// All tiers in fixed display order.
    pub const ALL: [TierId; 6] = [
        TierId::S,
        TierId::A,
        TierId::B,
        TierId::C,
        TierId::D,
        TierId::F,
    ];

    /// Stable label used in storage and presentation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    /// Parses a tier label, ignoring surrounding whitespace and case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "S" => Some(Self::S),
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "F" => Some(Self::F),
            _ => None,
        }
    }

    /// Zero-based position in display order.
    pub fn index(self) -> usize {
        match self {
            Self::S => 0,
            Self::A => 1,
            Self::B => 2,
            Self::C => 3,
            Self::D => 4,
            Self::F => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Tier displayed right before this one, if any.
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// Tier displayed right after this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl Default for TierId {
    fn default() -> Self {
        DEFAULT_TIER
    }
}

impl Display for TierId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
