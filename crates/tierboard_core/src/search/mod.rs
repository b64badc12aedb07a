//! Search-as-you-type filtering.
//!
//! # Responsibility
//! - Turn the query box text into an item predicate.
//! - Project the board for display without touching stored order.

pub mod filter;
