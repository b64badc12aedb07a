//! Board repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load and save the whole board as one unit.
//! - Keep SQL row shapes and placement encoding inside the persistence
//!   boundary.
//!
//! # Invariants
//! - `save` replaces stored placements atomically; a failed save leaves the
//!   previous board intact.
//! - `load` rejects gaps, duplicates and unknown tiers instead of repairing
//!   them.

use crate::db::migrations::latest_version;
use crate::db::{open_db, DbError};
use crate::model::board::{Board, BoardInvariantError};
use crate::model::item::{Item, ItemDraft, ItemId};
use crate::model::tier::TierId;
use log::{debug, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    item_uuid,
    tier,
    position,
    title,
    note,
    image
FROM board_items
ORDER BY tier ASC, position ASC;";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "board_items",
        &["item_uuid", "tier", "position", "title", "note", "image"],
    ),
    ("board_item_tags", &["item_uuid", "tag"]),
    ("board_meta", &["id", "item_count", "saved_at"]),
];

/// Result type used by board repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from board persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema version does not match this binary.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted rows cannot be converted into a valid board.
    InvalidData(String),
    /// Storage backend refused the request.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "board repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted board data: {message}"),
            Self::Unavailable(message) => write!(f, "board storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<BoardInvariantError> for RepoError {
    fn from(value: BoardInvariantError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Persistence gateway for full board snapshots.
pub trait BoardRepository {
    /// Loads the stored board; an empty store yields `Board::empty()`.
    fn load(&self) -> RepoResult<Board>;
    /// Replaces the stored board with `board`.
    fn save(&self, board: &Board) -> RepoResult<()>;
}

impl<R: BoardRepository + ?Sized> BoardRepository for &R {
    fn load(&self) -> RepoResult<Board> {
        (**self).load()
    }

    fn save(&self, board: &Board) -> RepoResult<()> {
        (**self).save(board)
    }
}

/// SQLite-backed board repository borrowing an open connection.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates a repository after checking schema readiness.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_board_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn load(&self) -> RepoResult<Board> {
        let mut tags = load_tags(self.conn)?;

        let mut stmt = self.conn.prepare(ITEM_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut placed: BTreeMap<TierId, Vec<(i64, Item)>> = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let (tier, position, item) = parse_item_row(row, &mut tags)?;
            placed.entry(tier).or_default().push((position, item));
        }

        let mut buckets = Vec::with_capacity(placed.len());
        for (tier, mut entries) in placed {
            entries.sort_by_key(|(position, _)| *position);
            for (expected, (position, item)) in entries.iter().enumerate() {
                if *position != expected as i64 {
                    return Err(RepoError::InvalidData(format!(
                        "tier {tier} has position {position} where {expected} was expected for item {}",
                        item.id
                    )));
                }
            }
            buckets.push((tier, entries.into_iter().map(|(_, item)| item).collect()));
        }

        let board = Board::from_buckets(buckets)?;
        debug!(
            "event=board_load module=repo status=ok items={}",
            board.item_count()
        );
        Ok(board)
    }

    fn save(&self, board: &Board) -> RepoResult<()> {
        board.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM board_item_tags;", [])?;
        tx.execute("DELETE FROM board_items;", [])?;

        {
            let mut insert_item = tx.prepare(
                "INSERT INTO board_items (
                    item_uuid,
                    tier,
                    position,
                    title,
                    note,
                    image
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            )?;
            let mut insert_tag =
                tx.prepare("INSERT INTO board_item_tags (item_uuid, tag) VALUES (?1, ?2);")?;

            for bucket in board.buckets() {
                for (position, item) in bucket.items().iter().enumerate() {
                    let item_uuid = item.id.to_string();
                    insert_item.execute(params![
                        item_uuid,
                        bucket.tier().as_str(),
                        position as i64,
                        item.title.as_str(),
                        item.note.as_deref(),
                        item.image.as_deref(),
                    ])?;
                    for tag in &item.tags {
                        insert_tag.execute(params![item_uuid, tag.as_str()])?;
                    }
                }
            }
        }

        tx.execute(
            "UPDATE board_meta
             SET item_count = ?1,
                 saved_at = (strftime('%s', 'now') * 1000)
             WHERE id = 1;",
            params![board.item_count() as i64],
        )?;
        tx.commit()?;

        info!(
            "event=board_save module=repo status=ok items={}",
            board.item_count()
        );
        Ok(())
    }
}

/// Board repository that opens its database file per call.
///
/// Suited to hosts that cannot keep a borrowed connection alive between
/// calls.
#[derive(Debug, Clone)]
pub struct SqliteFileBoardRepository {
    path: PathBuf,
}

impl SqliteFileBoardRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BoardRepository for SqliteFileBoardRepository {
    fn load(&self) -> RepoResult<Board> {
        let conn = open_db(&self.path)?;
        SqliteBoardRepository::try_new(&conn)?.load()
    }

    fn save(&self, board: &Board) -> RepoResult<()> {
        let conn = open_db(&self.path)?;
        SqliteBoardRepository::try_new(&conn)?.save(board)
    }
}

fn parse_item_row(
    row: &Row<'_>,
    tags: &mut HashMap<ItemId, Vec<String>>,
) -> RepoResult<(TierId, i64, Item)> {
    let uuid_raw: String = row.get(0)?;
    let tier_raw: String = row.get(1)?;
    let position: i64 = row.get(2)?;
    let title: String = row.get(3)?;
    let note: Option<String> = row.get(4)?;
    let image: Option<String> = row.get(5)?;

    let id = parse_uuid(&uuid_raw, "board_items.item_uuid")?;
    let tier = TierId::parse(&tier_raw)
        .ok_or_else(|| RepoError::InvalidData(format!("unknown tier `{tier_raw}` for item {id}")))?;

    let draft = ItemDraft {
        title,
        tags: tags.remove(&id).unwrap_or_default(),
        note,
        image,
    };
    let item = Item::with_id(id, draft)
        .map_err(|err| RepoError::InvalidData(format!("item {id}: {err}")))?;
    Ok((tier, position, item))
}

fn load_tags(conn: &Connection) -> RepoResult<HashMap<ItemId, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT item_uuid, tag
         FROM board_item_tags
         ORDER BY item_uuid ASC, tag ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tags: HashMap<ItemId, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let uuid_raw: String = row.get(0)?;
        let tag: String = row.get(1)?;
        let id = parse_uuid(&uuid_raw, "board_item_tags.item_uuid")?;
        tags.entry(id).or_default().push(tag);
    }
    Ok(tags)
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_board_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
