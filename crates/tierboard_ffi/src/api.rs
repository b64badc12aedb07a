//! FFI board API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the board engine to Dart via FRB as plain DTO envelopes.
//! - Own the single process-wide engine instance behind a mutex.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call that needs the engine fails with a message until
//!   `board_open` succeeded.
//! - Notices are queued until the host drains them with `board_take_notices`.

use log::warn;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tierboard_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Board, BoardLayout, BoardNotice, BoardService, DragOutcome, DropTarget, EngineConfig,
    GestureSignal, GestureSource, ItemDraft, ItemId, KeyCode, KeyDirection, KeyEvent, Notifier,
    Point, PointerEvent, RawInput, Rect, SqliteFileBoardRepository, TierId,
};

const DEFAULT_DB_FILE_NAME: &str = "tierboard.sqlite3";

type Engine = BoardService<SqliteFileBoardRepository, NoticeQueue>;

static ENGINE: Mutex<Option<Engine>> = Mutex::new(None);

/// Notifier that buffers notices for the host to drain.
#[derive(Default)]
struct NoticeQueue {
    pending: RefCell<Vec<BoardNotice>>,
}

impl Notifier for NoticeQueue {
    fn notify(&self, notice: &BoardNotice) {
        self.pending.borrow_mut().push(notice.clone());
    }
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes engine logging once per process.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`; conflicting calls fail.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One board item as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardItemDto {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub note: Option<String>,
    pub image: Option<String>,
}

/// One ordered bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketDto {
    /// Tier label (`S|A|B|C|D|F`).
    pub tier: String,
    pub items: Vec<BoardItemDto>,
}

/// Board snapshot (or projection) envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshotResponse {
    pub ok: bool,
    pub buckets: Vec<BucketDto>,
    pub revision: u64,
    pub pending_save: bool,
    pub message: String,
}

/// Candidate drop position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTargetDto {
    pub tier: String,
    pub index: u32,
}

/// Drag state after a gesture call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureResponse {
    pub ok: bool,
    pub dragging: bool,
    pub preview: Option<DropTargetDto>,
    /// `committed|unchanged|cancelled|no_target` when the call ended a drag.
    pub outcome: Option<String>,
    pub message: String,
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardActionResponse {
    pub ok: bool,
    pub item_id: Option<String>,
    pub message: String,
}

impl BoardActionResponse {
    fn success(message: impl Into<String>, item_id: Option<String>) -> Self {
        Self {
            ok: true,
            item_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item_id: None,
            message: message.into(),
        }
    }
}

/// Host-facing notice (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardNoticeDto {
    /// `item_moved|item_added|item_removed|save_failed`.
    pub kind: String,
    pub message: String,
    pub item_id: Option<String>,
}

/// Rectangle of one bucket container from the last render.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRectDto {
    pub tier: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle of one item card from the last render.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRectDto {
    pub item_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Opens (or reopens) the board engine on a SQLite file.
///
/// `db_path = None` uses `TIERBOARD_DB_PATH`, then a file in the temp dir.
/// Reopening replaces the previous engine and drops any active drag.
#[flutter_rust_bridge::frb(sync)]
pub fn board_open(db_path: Option<String>, activation_distance: Option<f64>) -> BoardActionResponse {
    let path = resolve_db_path(db_path);
    let mut config = EngineConfig::default().with_db_path(&path);
    if let Some(distance) = activation_distance {
        config = config.with_activation_distance(distance);
    }

    let repo = SqliteFileBoardRepository::new(&path);
    match BoardService::open(repo, NoticeQueue::default(), &config) {
        Ok(service) => {
            *lock_engine() = Some(service);
            BoardActionResponse::success("Board opened.", None)
        }
        Err(err) => BoardActionResponse::failure(format!("board_open failed: {err}")),
    }
}

/// Returns the authoritative board.
#[flutter_rust_bridge::frb(sync)]
pub fn board_snapshot() -> BoardSnapshotResponse {
    snapshot_response(|engine| Board::clone(&engine.current_board()))
}

/// Returns the board projected through the active filter.
#[flutter_rust_bridge::frb(sync)]
pub fn board_projection() -> BoardSnapshotResponse {
    snapshot_response(|engine| engine.current_projection())
}

/// Sets the search-as-you-type query; empty text clears the filter.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_filter(query: String) -> BoardActionResponse {
    action(|engine| {
        engine.set_filter(&query);
        Ok(BoardActionResponse::success("Filter updated.", None))
    })
}

/// Replaces layout geometry used by pointer collision.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_layout(buckets: Vec<BucketRectDto>, items: Vec<ItemRectDto>) -> BoardActionResponse {
    action(|engine| {
        let mut layout = BoardLayout::new();
        for bucket in buckets {
            let tier = parse_tier(&bucket.tier)?;
            layout.set_bucket(tier, Rect::new(bucket.x, bucket.y, bucket.width, bucket.height));
        }
        for item in items {
            let id = parse_item_id(&item.item_id)?;
            layout.set_item(id, Rect::new(item.x, item.y, item.width, item.height));
        }
        engine.set_layout(layout);
        Ok(BoardActionResponse::success("Layout updated.", None))
    })
}

/// Adds an item; `tier = None` places it in the default tier.
#[flutter_rust_bridge::frb(sync)]
pub fn board_add_item(
    title: String,
    tags: Vec<String>,
    note: Option<String>,
    image: Option<String>,
    tier: Option<String>,
) -> BoardActionResponse {
    action(|engine| {
        let tier = tier.as_deref().map(parse_tier).transpose()?;
        let draft = ItemDraft {
            title,
            tags,
            note,
            image,
        };
        let item = engine
            .add_item(draft, tier)
            .map_err(|err| format!("board_add_item failed: {err}"))?;
        Ok(BoardActionResponse::success(
            "Item added.",
            Some(item.id.to_string()),
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_remove_item(item_id: String) -> BoardActionResponse {
    action(|engine| {
        let id = parse_item_id(&item_id)?;
        engine
            .remove_item(id)
            .map_err(|err| format!("board_remove_item failed: {err}"))?;
        Ok(BoardActionResponse::success("Item removed.", Some(item_id)))
    })
}

/// Starts a drag; `source` is `pointer` or `keyboard`.
#[flutter_rust_bridge::frb(sync)]
pub fn board_gesture_start(item_id: String, source: String) -> GestureResponse {
    gesture(|engine| {
        let id = parse_item_id(&item_id)?;
        let source = parse_source(&source)?;
        // A start during an active drag is ignored; the response reports
        // the drag already in progress.
        if engine.is_dragging() {
            return Ok(None);
        }
        if !engine.on_gesture_start(id, source) {
            return Err(format!("drag not started: unknown item {id}"));
        }
        Ok(None)
    })
}

/// Feeds the dragged card rectangle.
#[flutter_rust_bridge::frb(sync)]
pub fn board_gesture_move_pointer(x: f64, y: f64, width: f64, height: f64) -> GestureResponse {
    gesture(|engine| {
        engine.on_gesture_move(GestureSignal::Pointer(Rect::new(x, y, width, height)));
        Ok(None)
    })
}

/// Feeds one keyboard step (`previous|next|previous_bucket|next_bucket`).
#[flutter_rust_bridge::frb(sync)]
pub fn board_gesture_move_key(direction: String) -> GestureResponse {
    gesture(|engine| {
        let direction = parse_direction(&direction)?;
        engine.on_gesture_move(GestureSignal::Keyboard(direction));
        Ok(None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_gesture_end() -> GestureResponse {
    gesture(|engine| {
        engine
            .on_gesture_end()
            .map(Some)
            .map_err(|err| format!("board_gesture_end failed: {err}"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_gesture_cancel() -> GestureResponse {
    gesture(|engine| Ok(Some(engine.on_gesture_cancel())))
}

/// Routes a raw key press through the input normalizer.
///
/// `code` is `space|enter|escape|arrow_up|arrow_down|arrow_left|arrow_right`.
#[flutter_rust_bridge::frb(sync)]
pub fn board_key_event(code: String, focused_item_id: Option<String>) -> GestureResponse {
    gesture(|engine| {
        let code = parse_key_code(&code)?;
        let focused = focused_item_id.as_deref().map(parse_item_id).transpose()?;
        raw_input(engine, RawInput::Keyboard(KeyEvent::new(code, focused)))
    })
}

/// Pointer pressed on an item card whose rectangle is `(rect_x, rect_y, rect_width, rect_height)`.
#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_down(
    item_id: String,
    x: f64,
    y: f64,
    rect_x: f64,
    rect_y: f64,
    rect_width: f64,
    rect_height: f64,
) -> GestureResponse {
    gesture(|engine| {
        let item = parse_item_id(&item_id)?;
        let event = PointerEvent::Down {
            item,
            at: Point::new(x, y),
            item_rect: Rect::new(rect_x, rect_y, rect_width, rect_height),
        };
        raw_input(engine, RawInput::Pointer(event))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_move(x: f64, y: f64) -> GestureResponse {
    gesture(|engine| {
        raw_input(
            engine,
            RawInput::Pointer(PointerEvent::Move {
                at: Point::new(x, y),
            }),
        )
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_up(x: f64, y: f64) -> GestureResponse {
    gesture(|engine| {
        raw_input(
            engine,
            RawInput::Pointer(PointerEvent::Up {
                at: Point::new(x, y),
            }),
        )
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_cancel() -> GestureResponse {
    gesture(|engine| raw_input(engine, RawInput::Pointer(PointerEvent::Cancel)))
}

/// Current drag preview without feeding input.
#[flutter_rust_bridge::frb(sync)]
pub fn board_preview() -> GestureResponse {
    gesture(|_| Ok(None))
}

/// Drains queued notices in emission order.
#[flutter_rust_bridge::frb(sync)]
pub fn board_take_notices() -> Vec<BoardNoticeDto> {
    let mut guard = lock_engine();
    let Some(engine) = guard.as_mut() else {
        return Vec::new();
    };
    engine
        .notifier()
        .pending
        .take()
        .into_iter()
        .map(to_notice_dto)
        .collect()
}

/// Retries a pending save; `ok` is true when nothing is pending afterwards.
#[flutter_rust_bridge::frb(sync)]
pub fn board_flush() -> BoardActionResponse {
    action(|engine| {
        if engine.flush() {
            Ok(BoardActionResponse::success("Board saved.", None))
        } else {
            Err("board save still pending".to_string())
        }
    })
}

fn lock_engine() -> MutexGuard<'static, Option<Engine>> {
    ENGINE.lock().unwrap_or_else(|poisoned| {
        warn!("event=ffi_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    })
}

fn with_engine<T>(f: impl FnOnce(&mut Engine) -> Result<T, String>) -> Result<T, String> {
    let mut guard = lock_engine();
    let engine = guard
        .as_mut()
        .ok_or_else(|| "board engine not opened; call board_open first".to_string())?;
    f(engine)
}

fn action(f: impl FnOnce(&mut Engine) -> Result<BoardActionResponse, String>) -> BoardActionResponse {
    with_engine(f).unwrap_or_else(BoardActionResponse::failure)
}

fn gesture(f: impl FnOnce(&mut Engine) -> Result<Option<DragOutcome>, String>) -> GestureResponse {
    let result = with_engine(|engine| {
        let outcome = f(engine)?;
        Ok((outcome, engine.is_dragging(), engine.current_preview()))
    });
    match result {
        Ok((outcome, dragging, preview)) => GestureResponse {
            ok: true,
            dragging,
            preview: preview.map(to_target_dto),
            outcome: outcome.and_then(outcome_label).map(str::to_string),
            message: String::new(),
        },
        Err(message) => {
            let dragging = with_engine(|engine| Ok(engine.is_dragging())).unwrap_or(false);
            GestureResponse {
                ok: false,
                dragging,
                preview: None,
                outcome: None,
                message,
            }
        }
    }
}

fn raw_input(engine: &mut Engine, input: RawInput) -> Result<Option<DragOutcome>, String> {
    engine
        .handle_input(input)
        .map_err(|err| format!("input handling failed: {err}"))
}

fn snapshot_response(project: impl FnOnce(&Engine) -> Board) -> BoardSnapshotResponse {
    let result = with_engine(|engine| {
        Ok((
            project(engine),
            engine.revision(),
            engine.has_pending_save(),
        ))
    });
    match result {
        Ok((board, revision, pending_save)) => BoardSnapshotResponse {
            ok: true,
            buckets: to_bucket_dtos(&board),
            revision,
            pending_save,
            message: String::new(),
        },
        Err(message) => BoardSnapshotResponse {
            ok: false,
            buckets: Vec::new(),
            revision: 0,
            pending_save: false,
            message,
        },
    }
}

fn resolve_db_path(db_path: Option<String>) -> PathBuf {
    let explicit = db_path
        .or_else(|| std::env::var("TIERBOARD_DB_PATH").ok())
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty());
    match explicit {
        Some(raw) => PathBuf::from(raw),
        None => std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
    }
}

fn parse_item_id(raw: &str) -> Result<ItemId, String> {
    ItemId::parse_str(raw.trim()).map_err(|_| format!("invalid item id `{raw}`"))
}

fn parse_tier(raw: &str) -> Result<TierId, String> {
    TierId::parse(raw).ok_or_else(|| format!("unknown tier `{raw}`; expected S|A|B|C|D|F"))
}

fn parse_source(raw: &str) -> Result<GestureSource, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pointer" => Ok(GestureSource::Pointer),
        "keyboard" => Ok(GestureSource::Keyboard),
        other => Err(format!(
            "unknown gesture source `{other}`; expected pointer|keyboard"
        )),
    }
}

fn parse_direction(raw: &str) -> Result<KeyDirection, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "previous" => Ok(KeyDirection::Previous),
        "next" => Ok(KeyDirection::Next),
        "previous_bucket" => Ok(KeyDirection::PreviousBucket),
        "next_bucket" => Ok(KeyDirection::NextBucket),
        other => Err(format!(
            "unknown key direction `{other}`; expected previous|next|previous_bucket|next_bucket"
        )),
    }
}

fn parse_key_code(raw: &str) -> Result<KeyCode, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "space" => Ok(KeyCode::Space),
        "enter" => Ok(KeyCode::Enter),
        "escape" => Ok(KeyCode::Escape),
        "arrow_up" => Ok(KeyCode::ArrowUp),
        "arrow_down" => Ok(KeyCode::ArrowDown),
        "arrow_left" => Ok(KeyCode::ArrowLeft),
        "arrow_right" => Ok(KeyCode::ArrowRight),
        other => Err(format!("unsupported key `{other}`")),
    }
}

fn outcome_label(outcome: DragOutcome) -> Option<&'static str> {
    match outcome {
        DragOutcome::Idle => None,
        DragOutcome::Committed(moved) if moved.changed() => Some("committed"),
        DragOutcome::Committed(_) => Some("unchanged"),
        DragOutcome::Cancelled {
            reason: tierboard_core::CancelReason::NoValidTarget,
            ..
        } => Some("no_target"),
        DragOutcome::Cancelled { .. } => Some("cancelled"),
    }
}

fn to_target_dto(target: DropTarget) -> DropTargetDto {
    DropTargetDto {
        tier: target.tier.as_str().to_string(),
        index: target.index as u32,
    }
}

fn to_bucket_dtos(board: &Board) -> Vec<BucketDto> {
    board
        .buckets()
        .iter()
        .map(|bucket| BucketDto {
            tier: bucket.tier().as_str().to_string(),
            items: bucket
                .items()
                .iter()
                .map(|item| BoardItemDto {
                    id: item.id.to_string(),
                    title: item.title.clone(),
                    tags: item.tags.clone(),
                    note: item.note.clone(),
                    image: item.image.clone(),
                })
                .collect(),
        })
        .collect()
}

fn to_notice_dto(notice: BoardNotice) -> BoardNoticeDto {
    let item_id = match &notice {
        BoardNotice::ItemMoved { item, .. }
        | BoardNotice::ItemAdded { item, .. }
        | BoardNotice::ItemRemoved { item } => Some(item.to_string()),
        BoardNotice::SaveFailed { .. } => None,
    };
    BoardNoticeDto {
        kind: notice.kind().to_string(),
        message: notice.message(),
        item_id,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        board_add_item, board_gesture_end, board_gesture_move_key, board_gesture_start,
        board_key_event, board_open, board_projection, board_remove_item, board_set_filter,
        board_snapshot, board_take_notices, core_version, init_logging, parse_direction,
        parse_key_code, ping,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn parsers_reject_unknown_values() {
        assert!(parse_direction("sideways").is_err());
        assert!(parse_key_code("tab").is_err());
        assert!(parse_key_code(" Arrow_Down ").is_ok());
    }

    #[test]
    fn board_flow_moves_filters_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffi.sqlite3");
        let path_str = path.to_str().unwrap().to_string();

        let opened = board_open(Some(path_str.clone()), None);
        assert!(opened.ok, "{}", opened.message);

        let added = board_add_item(
            "Given".to_string(),
            vec!["Music".to_string()],
            None,
            None,
            Some("s".to_string()),
        );
        assert!(added.ok, "{}", added.message);
        let given_id = added.item_id.unwrap();
        let second = board_add_item("Free!".to_string(), Vec::new(), None, None, None);
        let free_id = second.item_id.unwrap();

        let started = board_gesture_start(free_id.clone(), "keyboard".to_string());
        assert!(started.ok && started.dragging, "{}", started.message);
        let repeated = board_gesture_start(given_id.clone(), "keyboard".to_string());
        assert!(repeated.ok && repeated.dragging, "{}", repeated.message);
        assert_eq!(repeated.preview, started.preview);
        assert!(repeated.outcome.is_none());
        board_gesture_move_key("previous_bucket".to_string());
        let stepped = board_gesture_move_key("previous_bucket".to_string());
        assert_eq!(stepped.preview.as_ref().map(|t| t.tier.as_str()), Some("S"));
        let ended = board_gesture_end();
        assert_eq!(ended.outcome.as_deref(), Some("committed"));

        let snapshot = board_snapshot();
        assert!(snapshot.ok);
        let s_ids: Vec<&str> = snapshot.buckets[0]
            .items
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(s_ids, vec![given_id.as_str(), free_id.as_str()]);

        let notices = board_take_notices();
        let kinds: Vec<&str> = notices.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, vec!["item_added", "item_added", "item_moved"]);
        assert_eq!(notices[2].message, "Moved to S tier!");
        assert!(board_take_notices().is_empty());

        assert!(board_set_filter("music".to_string()).ok);
        let projection = board_projection();
        assert_eq!(projection.buckets[0].items.len(), 1);

        let key = board_key_event("space".to_string(), Some(given_id.clone()));
        assert!(key.dragging);
        let escaped = board_key_event("escape".to_string(), None);
        assert_eq!(escaped.outcome.as_deref(), Some("cancelled"));

        assert!(board_remove_item(given_id).ok);
        assert!(!board_remove_item("not-a-uuid".to_string()).ok);

        let reopened = board_open(Some(path_str), None);
        assert!(reopened.ok);
        let snapshot = board_snapshot();
        assert_eq!(snapshot.buckets[0].items.len(), 1);
        assert_eq!(snapshot.buckets[0].items[0].id, free_id);
    }
}
