//! Tier board domain model.
//!
//! # Responsibility
//! - Define items, tiers and the board snapshot used by the ordering engine.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Placement lives in the board, never inside the item record.

pub mod board;
pub mod item;
pub mod tier;
