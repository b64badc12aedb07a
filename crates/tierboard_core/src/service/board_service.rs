//! Board use-case service.
//!
//! # Responsibility
//! - Wire input normalization, the drag session, the order store and the
//!   filter projection behind one entry point for the presentation layer.
//! - Persist every committed snapshot and surface notices to the host.
//!
//! # Invariants
//! - Only a committed move, an added item or a removed item triggers a save.
//! - A failed save never rolls back memory; it is retried on the next
//!   mutation and reported through the notifier.
//! - Items cannot be added or removed while a drag is active.

use crate::config::EngineConfig;
use crate::engine::collision::{DropTarget, GestureSignal};
use crate::engine::geometry::BoardLayout;
use crate::engine::input::{Gesture, GestureSource, InputNormalizer, RawInput};
use crate::engine::order_store::{OrderStore, StoreError};
use crate::engine::session::{DragOutcome, DragSession, DragState};
use crate::logging::sanitize_message;
use crate::model::board::{Board, Slot};
use crate::model::item::{Item, ItemDraft, ItemId, ItemValidationError};
use crate::model::tier::{TierId, DEFAULT_TIER};
use crate::repo::board_repo::{BoardRepository, RepoError};
use crate::search::filter::{project, FilterPredicate};
use crate::service::notifier::{BoardNotice, Notifier};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const MAX_NOTICE_MESSAGE_CHARS: usize = 200;

pub type BoardServiceResult<T> = Result<T, BoardServiceError>;

#[derive(Debug)]
pub enum BoardServiceError {
    /// Engine configuration was rejected.
    Config(String),
    Store(StoreError),
    Repo(RepoError),
    Validation(ItemValidationError),
    /// Operation is not allowed while a drag is active.
    DragInProgress,
}

impl Display for BoardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "invalid engine config: {message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DragInProgress => write!(f, "operation not allowed while a drag is active"),
        }
    }
}

impl Error for BoardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::DragInProgress => None,
        }
    }
}

impl From<StoreError> for BoardServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for BoardServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ItemValidationError> for BoardServiceError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Entry point for the presentation layer.
pub struct BoardService<R: BoardRepository, N: Notifier> {
    repo: R,
    notifier: N,
    store: OrderStore,
    session: DragSession,
    normalizer: InputNormalizer,
    layout: BoardLayout,
    filter: FilterPredicate,
    pending_save: bool,
}

impl<R: BoardRepository, N: Notifier> BoardService<R, N> {
    /// Validates `config`, loads the stored board and builds the engine.
    ///
    /// # Errors
    /// - `Config` when `config` is invalid.
    /// - `Repo` when the stored board cannot be loaded.
    /// - `Store` when the loaded board violates board invariants.
    pub fn open(repo: R, notifier: N, config: &EngineConfig) -> BoardServiceResult<Self> {
        config.validate().map_err(BoardServiceError::Config)?;
        let board = repo.load()?;
        let store = OrderStore::new(board)?;
        info!(
            "event=board_open module=service status=ok items={}",
            store.board().item_count()
        );

        Ok(Self {
            repo,
            notifier,
            store,
            session: DragSession::new(),
            normalizer: InputNormalizer::new(config.activation_distance),
            layout: BoardLayout::new(),
            filter: FilterPredicate::match_all(),
            pending_save: false,
        })
    }

    /// Starts a drag of `item`; `false` when a drag is active or the item is
    /// unknown.
    pub fn on_gesture_start(&mut self, item: ItemId, source: GestureSource) -> bool {
        self.session.start(item, source, &self.store)
    }

    /// Feeds one gesture step and returns the current candidate target.
    pub fn on_gesture_move(&mut self, signal: GestureSignal) -> Option<DropTarget> {
        self.session.update(&signal, &self.store, &self.layout)
    }

    /// Ends the drag, committing the candidate when there is one.
    ///
    /// A committed move is saved right away. Save failures do not surface
    /// here: the move stays applied and the save is retried later.
    ///
    /// # Errors
    /// - `Store` when the candidate is no longer valid; the board is
    ///   restored to its state at drag start.
    pub fn on_gesture_end(&mut self) -> BoardServiceResult<DragOutcome> {
        self.normalizer.reset();
        let outcome = self.session.confirm(&mut self.store)?;

        match outcome {
            DragOutcome::Committed(committed) if committed.changed() => {
                info!(
                    "event=drag_commit module=service status=ok item={} tier={} index={}",
                    committed.item, committed.to.tier, committed.to.index
                );
                self.notifier.notify(&BoardNotice::ItemMoved {
                    item: committed.item,
                    tier: committed.to.tier,
                });
                self.persist();
            }
            DragOutcome::Committed(_) => {
                if self.pending_save {
                    self.persist();
                }
            }
            DragOutcome::Idle | DragOutcome::Cancelled { .. } => {}
        }
        Ok(outcome)
    }

    /// Cancels the drag; the board is left as it was at drag start.
    pub fn on_gesture_cancel(&mut self) -> DragOutcome {
        self.normalizer.reset();
        self.session.cancel(&mut self.store)
    }

    /// Routes one raw pointer or keyboard event through the input normalizer.
    ///
    /// Returns the terminal outcome when the event ended a drag.
    pub fn handle_input(&mut self, input: RawInput) -> BoardServiceResult<Option<DragOutcome>> {
        let gestures = self.normalizer.normalize(input);
        let mut outcome = None;

        for gesture in gestures {
            match gesture {
                Gesture::Start { item, source } => {
                    if !self.on_gesture_start(item, source) {
                        // Unknown item or a drag owned elsewhere: drop the stream.
                        self.normalizer.reset();
                        return Ok(None);
                    }
                }
                Gesture::Move(signal) => {
                    self.on_gesture_move(signal);
                }
                Gesture::Confirm => outcome = Some(self.on_gesture_end()?),
                Gesture::Cancel => outcome = Some(self.on_gesture_cancel()),
            }
        }
        Ok(outcome)
    }

    pub fn current_preview(&self) -> Option<DropTarget> {
        self.session.preview()
    }

    pub fn drag_state(&self) -> DragState {
        self.session.state()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_active()
    }

    /// Authoritative board snapshot.
    pub fn current_board(&self) -> Arc<Board> {
        self.store.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = FilterPredicate::new(query);
    }

    pub fn clear_filter(&mut self) {
        self.filter = FilterPredicate::match_all();
    }

    pub fn filter(&self) -> &FilterPredicate {
        &self.filter
    }

    /// Board projected through the active filter.
    pub fn current_projection(&self) -> Board {
        project(self.store.board(), &self.filter)
    }

    /// Replaces the geometry used for pointer collision.
    pub fn set_layout(&mut self, layout: BoardLayout) {
        self.layout = layout;
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    /// Adds a new item at the end of `tier` (the default tier when `None`).
    ///
    /// # Errors
    /// - `DragInProgress` while a drag is active.
    /// - `Validation` when the draft title is blank.
    pub fn add_item(&mut self, draft: ItemDraft, tier: Option<TierId>) -> BoardServiceResult<Item> {
        self.ensure_idle()?;
        let item = Item::from_draft(draft)?;
        let tier = tier.unwrap_or(DEFAULT_TIER);
        let slot = self.store.insert_item(item.clone(), tier)?;

        info!(
            "event=item_add module=service status=ok item={} tier={} index={}",
            item.id, slot.tier, slot.index
        );
        self.notifier.notify(&BoardNotice::ItemAdded {
            item: item.id,
            title: item.title.clone(),
            tier,
        });
        self.persist();
        Ok(item)
    }

    /// Removes an item and compacts its bucket.
    ///
    /// # Errors
    /// - `DragInProgress` while a drag is active.
    /// - `Store(ItemNotFound)` when the item is not on the board.
    pub fn remove_item(&mut self, id: ItemId) -> BoardServiceResult<Item> {
        self.ensure_idle()?;
        let removed = self.store.remove_item(id)?;

        info!("event=item_remove module=service status=ok item={id}");
        self.notifier.notify(&BoardNotice::ItemRemoved { item: id });
        self.persist();
        Ok(removed)
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Current placement of one item.
    pub fn locate(&self, id: ItemId) -> Option<Slot> {
        self.store.board().locate(id)
    }

    /// True when the last save failed and has not been retried successfully.
    pub fn has_pending_save(&self) -> bool {
        self.pending_save
    }

    /// Retries a pending save now; returns whether nothing is pending after.
    pub fn flush(&mut self) -> bool {
        if self.pending_save {
            self.persist();
        }
        !self.pending_save
    }

    fn ensure_idle(&self) -> BoardServiceResult<()> {
        if self.session.is_active() {
            return Err(BoardServiceError::DragInProgress);
        }
        Ok(())
    }

    fn persist(&mut self) {
        let snapshot = self.store.snapshot();
        match self.repo.save(&snapshot) {
            Ok(()) => {
                if self.pending_save {
                    info!(
                        "event=board_save module=service status=recovered revision={}",
                        self.store.revision()
                    );
                }
                self.pending_save = false;
            }
            Err(err) => {
                let message = sanitize_message(&err.to_string(), MAX_NOTICE_MESSAGE_CHARS);
                warn!(
                    "event=board_save module=service status=error revision={} error={}",
                    self.store.revision(),
                    message
                );
                self.pending_save = true;
                self.notifier.notify(&BoardNotice::SaveFailed { message });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardService, BoardServiceError};
    use crate::config::EngineConfig;
    use crate::engine::input::GestureSource;
    use crate::model::item::ItemDraft;
    use crate::model::tier::TierId;
    use crate::repo::memory_repo::MemoryBoardRepository;
    use crate::service::notifier::NoopNotifier;

    #[test]
    fn open_rejects_invalid_config() {
        let repo = MemoryBoardRepository::new();
        let config = EngineConfig::default().with_activation_distance(-3.0);
        let err = BoardService::open(&repo, NoopNotifier, &config).err().unwrap();
        assert!(matches!(err, BoardServiceError::Config(_)));
    }

    #[test]
    fn add_item_defaults_to_b_tier_and_saves() {
        let repo = MemoryBoardRepository::new();
        let mut service = BoardService::open(&repo, NoopNotifier, &EngineConfig::default()).unwrap();

        let item = service.add_item(ItemDraft::new("  Given "), None).unwrap();
        assert_eq!(item.title, "Given");
        assert_eq!(service.locate(item.id).unwrap().tier, TierId::B);
        assert_eq!(repo.save_count(), 1);
    }

    #[test]
    fn mutations_are_rejected_during_drag() {
        let repo = MemoryBoardRepository::new();
        let mut service = BoardService::open(&repo, NoopNotifier, &EngineConfig::default()).unwrap();
        let item = service.add_item(ItemDraft::new("a"), Some(TierId::S)).unwrap();

        assert!(service.on_gesture_start(item.id, GestureSource::Keyboard));
        assert!(matches!(
            service.add_item(ItemDraft::new("b"), None),
            Err(BoardServiceError::DragInProgress)
        ));
        assert!(matches!(
            service.remove_item(item.id),
            Err(BoardServiceError::DragInProgress)
        ));
        service.on_gesture_cancel();
        assert!(service.remove_item(item.id).is_ok());
    }
}
