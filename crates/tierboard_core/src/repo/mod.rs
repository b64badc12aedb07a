//! Board persistence gateway and its implementations.
//!
//! # Responsibility
//! - Define the whole-board load/save contract used by services.
//! - Isolate SQLite row shapes from engine and service code.
//!
//! # Invariants
//! - Repositories store and return complete, validated boards only.

pub mod board_repo;
pub mod memory_repo;
