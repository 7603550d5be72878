//! Snapshot repository contract and SQLite implementation.
//!
//! The durable form of the story collection is one JSON document (an array
//! of stories with nested chapters) held in a single key-value slot row.
//! Every save overwrites the whole document, which is acceptable at
//! single-user notebook volumes and keeps recovery trivial.
//!
//! # Invariants
//! - `load` returns `Ok(None)` for both an absent slot and an
//!   undeserializable payload; transport failures are the only errors.
//! - `save` leaves the slot holding exactly the serialization of the
//!   collection it was given.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::story::Story;
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot key of the persisted story collection.
pub const STORY_SLOT: &str = "writer-app-stories";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for snapshot persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode(serde_json::Error),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: user_version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::UninitializedConnection { .. } | Self::MissingRequiredTable(_) => None,
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

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Persistence port for the story collection.
///
/// The store loads once at startup and saves the full collection after
/// every mutation; implementations own the serialized layout.
pub trait SnapshotRepository {
    /// Reads the persisted collection. `None` means "start empty": the
    /// slot is absent or its payload could not be understood.
    fn load(&self) -> RepoResult<Option<Vec<Story>>>;

    /// Overwrites the persisted collection with `stories`.
    fn save(&self, stories: &[Story]) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// Rejects connections that skipped `db::open_db` bootstrap instead of
    /// failing later on the first query.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version =
            conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        if actual_version == 0 {
            return Err(RepoError::UninitializedConnection {
                expected_version: latest_version(),
                actual_version,
            });
        }
        if !table_exists(conn, "slots")? {
            return Err(RepoError::MissingRequiredTable("slots"));
        }
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load(&self) -> RepoResult<Option<Vec<Story>>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE slot = ?1;",
                [STORY_SLOT],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            info!("event=snapshot_load module=repo status=empty slot={STORY_SLOT}");
            return Ok(None);
        };

        match serde_json::from_str::<Vec<Story>>(&payload) {
            Ok(stories) => {
                info!(
                    "event=snapshot_load module=repo status=ok slot={STORY_SLOT} stories={}",
                    stories.len()
                );
                Ok(Some(stories))
            }
            Err(err) => {
                // Corrupt data is discarded, not fatal; the next save
                // overwrites the slot with a clean snapshot.
                warn!(
                    "event=snapshot_load module=repo status=discarded slot={STORY_SLOT} error={err}"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, stories: &[Story]) -> RepoResult<()> {
        let payload = serde_json::to_string(stories)?;
        self.conn.execute(
            "INSERT INTO slots (slot, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(slot) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![STORY_SLOT, payload],
        )?;
        debug!(
            "event=snapshot_save module=repo status=ok slot={STORY_SLOT} stories={} bytes={}",
            stories.len(),
            payload.len()
        );
        Ok(())
    }
}

fn table_exists(conn: &Connection, table_name: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
