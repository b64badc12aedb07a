//! Notification sink for user-facing board events.
//!
//! # Responsibility
//! - Describe board events the host may surface (toasts, banners).
//! - Keep presentation out of core: the host decides how a notice is shown.

use crate::model::item::ItemId;
use crate::model::tier::TierId;
use log::info;
use serde::Serialize;
use std::sync::Arc;

/// Event emitted after a board mutation or a failed save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardNotice {
    ItemMoved { item: ItemId, tier: TierId },
    ItemAdded { item: ItemId, title: String, tier: TierId },
    ItemRemoved { item: ItemId },
    SaveFailed { message: String },
}

impl BoardNotice {
    /// Short human-readable text for the notice.
    pub fn message(&self) -> String {
        match self {
            Self::ItemMoved { tier, .. } => format!("Moved to {tier} tier!"),
            Self::ItemAdded { title, .. } => format!("Added \"{title}\" to library!"),
            Self::ItemRemoved { .. } => "Removed from library".to_string(),
            Self::SaveFailed { .. } => "Could not save your board; will retry".to_string(),
        }
    }

    /// Stable snake_case kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ItemMoved { .. } => "item_moved",
            Self::ItemAdded { .. } => "item_added",
            Self::ItemRemoved { .. } => "item_removed",
            Self::SaveFailed { .. } => "save_failed",
        }
    }
}

pub trait Notifier {
    fn notify(&self, notice: &BoardNotice);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notice: &BoardNotice) {
        (**self).notify(notice)
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: &BoardNotice) {
        (**self).notify(notice)
    }
}

/// Drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notice: &BoardNotice) {}
}

/// Records notices as log events (kind only; titles stay out of logs).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &BoardNotice) {
        info!(
            "event=board_notice module=service status=ok kind={}",
            notice.kind()
        );
    }
}
