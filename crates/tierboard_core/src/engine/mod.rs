//! Drag-and-drop ordering engine.
//!
//! # Responsibility
//! - Normalize pointer and keyboard input into drag gestures (`input`).
//! - Resolve drop targets from layout geometry or key steps (`collision`).
//! - Run the single-drag lifecycle (`session`) against the authoritative
//!   ordered store (`order_store`).
//!
//! # Invariants
//! - Only `OrderStore` creates new board snapshots.
//! - Everything here is synchronous and single-threaded.

pub mod collision;
pub mod geometry;
pub mod input;
pub mod order_store;
pub mod session;
