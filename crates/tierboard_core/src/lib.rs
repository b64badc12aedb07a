//! Core ordering engine for the tier board.
//! This crate is the single source of truth for placement invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{EngineConfig, DEFAULT_ACTIVATION_DISTANCE_PX};
pub use engine::collision::{
    resolve_keyboard, resolve_pointer, DropTarget, GestureSignal, KeyDirection,
};
pub use engine::geometry::{BoardLayout, Point, Rect};
pub use engine::input::{
    Gesture, GestureSource, InputNormalizer, KeyCode, KeyEvent, PointerEvent, RawInput,
};
pub use engine::order_store::{InvalidMove, OrderStore, StoreCheckpoint, StoreError, StoreResult};
pub use engine::session::{CancelReason, CommittedMove, DragOutcome, DragSession, DragState};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::board::{Board, BoardInvariantError, Bucket, Slot};
pub use model::item::{Item, ItemDraft, ItemId, ItemValidationError};
pub use model::tier::{TierId, DEFAULT_TIER};
pub use repo::board_repo::{
    BoardRepository, RepoError, RepoResult, SqliteBoardRepository, SqliteFileBoardRepository,
};
pub use repo::memory_repo::MemoryBoardRepository;
pub use search::filter::{project, FilterPredicate};
pub use service::board_service::{BoardService, BoardServiceError, BoardServiceResult};
pub use service::notifier::{BoardNotice, LogNotifier, NoopNotifier, Notifier};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
