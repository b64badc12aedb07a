//! Search filter projection over the board.
//!
//! # Responsibility
//! - Normalize the search-as-you-type query into a predicate.
//! - Project a board down to matching items for display.
//!
//! # Invariants
//! - Projection never writes back; stored order is untouched.
//! - Matching items keep their relative order inside each bucket.
//! - An empty query matches every item.

use crate::model::board::Board;
use crate::model::item::Item;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Case-insensitive substring predicate over item title and tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    needle: String,
}

impl FilterPredicate {
    /// Builds a predicate from raw query text.
    ///
    /// The query is trimmed, inner whitespace runs collapse to one space and
    /// matching ignores case.
    pub fn new(query: &str) -> Self {
        let collapsed = WHITESPACE_RE.replace_all(query.trim(), " ");
        Self {
            needle: collapsed.to_lowercase(),
        }
    }

    /// Predicate that accepts every item.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Normalized query text.
    pub fn query(&self) -> &str {
        &self.needle
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, item: &Item) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        item.title.to_lowercase().contains(&self.needle)
            || item
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&self.needle))
    }
}

/// Returns a board holding only items accepted by `predicate`.
pub fn project(board: &Board, predicate: &FilterPredicate) -> Board {
    if predicate.is_empty() {
        return board.clone();
    }
    board.retain_items(|item| predicate.matches(item))
}
