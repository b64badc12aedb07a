//! Board item model.
//!
//! # Responsibility
//! - Define the record placed on the tier board and its attribute bag.
//! - Normalize user-provided attributes before they enter the board.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `title` is trimmed and non-empty.
//! - `tags` are lowercase, trimmed, deduplicated and sorted.
//!
//! An item does not store its own `(tier, position)`; the owning bucket is
//! the only source of truth for placement (see `Board::locate`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a board item.
pub type ItemId = Uuid;

/// Validation failures for item attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Title is blank after trim.
    EmptyTitle,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "item title must not be blank"),
        }
    }
}

impl Error for ItemValidationError {}

/// Caller-provided attributes for a new item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    pub tags: Vec<String>,
    pub note: Option<String>,
    /// Cover image reference (URL or local path), rendered by the host.
    pub image: Option<String>,
}

impl ItemDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Item record owned by exactly one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub tags: Vec<String>,
    pub note: Option<String>,
    pub image: Option<String>,
}

impl Item {
    /// Creates an item with a generated stable ID from normalized draft data.
    pub fn from_draft(draft: ItemDraft) -> Result<Self, ItemValidationError> {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Creates an item with a caller-provided ID.
    ///
    /// Used by persistence paths where identity already exists.
    pub fn with_id(id: ItemId, draft: ItemDraft) -> Result<Self, ItemValidationError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ItemValidationError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.to_string(),
            tags: normalize_tags(&draft.tags),
            note: normalize_optional_text(draft.note),
            image: normalize_optional_text(draft.image),
        })
    }

    /// Checks attribute invariants on an already-constructed item.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.title.trim().is_empty() {
            return Err(ItemValidationError::EmptyTitle);
        }
        Ok(())
    }
}

/// Normalizes one tag to its stored form.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .filter_map(|tag| normalize_tag(tag))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
