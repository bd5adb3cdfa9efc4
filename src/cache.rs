//! Resume cache: a durable record of which source messages have already
//! landed on the destination, keyed by `(folder, source UID)`.
//!
//! Every [`Cache::mark`] call commits before returning, so a crash or
//! `SIGINT` right after `mark()` never leaves a message re-transferred on
//! the next run. Read failures degrade to "not yet transferred" rather
//! than aborting the run; write failures are logged and swallowed so a
//! cache hiccup doesn't turn into a lost transfer.

use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;
use std::path::Path;
use tracing::error;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS transferred (
        folder          TEXT NOT NULL,
        source_uid      TEXT NOT NULL,
        dest_uid        TEXT,
        message_size    INTEGER,
        transferred_at  TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (folder, source_uid)
    )
";

const CREATE_FOLDER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transferred_folder ON transferred(folder)";

const CREATE_TIME_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transferred_at ON transferred(transferred_at)";

const IS_TRANSFERRED: &str =
    "SELECT 1 FROM transferred WHERE folder = ?1 AND source_uid = ?2";

const SELECT_TRANSFERRED_UIDS: &str =
    "SELECT source_uid FROM transferred WHERE folder = ?1";

const INSERT_MARK: &str = "
    INSERT OR IGNORE INTO transferred (folder, source_uid, dest_uid, message_size)
    VALUES (?1, ?2, ?3, ?4)
";

const STATS_ALL: &str = "SELECT COUNT(*), COALESCE(SUM(message_size), 0) FROM transferred";
const STATS_FOLDER: &str =
    "SELECT COUNT(*), COALESCE(SUM(message_size), 0) FROM transferred WHERE folder = ?1";

/// Aggregate counters returned by [`Cache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub count: u64,
    pub total_size: u64,
}

/// A `SQLite`-backed resume cache.
pub struct Cache {
    conn: Connection,
}

impl Cache {
    /// Open (creating if absent) the cache database at `path` and ensure
    /// its schema exists.
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute(CREATE_TABLE, [])?;
        conn.execute(CREATE_FOLDER_INDEX, [])?;
        conn.execute(CREATE_TIME_INDEX, [])?;
        Ok(Self { conn })
    }

    /// Open an in-memory cache, for tests.
    #[must_use]
    pub fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("in-memory sqlite connection");
        conn.execute(CREATE_TABLE, []).expect("create transferred table");
        conn.execute(CREATE_FOLDER_INDEX, []).expect("create folder index");
        conn.execute(CREATE_TIME_INDEX, []).expect("create time index");
        Self { conn }
    }

    /// Whether `source_uid` in `folder` has already been transferred.
    ///
    /// A read error is treated as "not yet transferred" - the caller will
    /// attempt the transfer again, which is always safe because `mark`
    /// is idempotent.
    #[must_use]
    pub fn is_transferred(&self, folder: &str, source_uid: &str) -> bool {
        self.conn
            .query_row(IS_TRANSFERRED, params![folder, source_uid], |_| Ok(()))
            .optional()
            .unwrap_or_else(|err| {
                error!("cache lookup failed for {folder}/{source_uid}: {err}; assuming not transferred");
                None
            })
            .is_some()
    }

    /// All source UIDs in `folder` already marked as transferred.
    #[must_use]
    pub fn transferred_uids(&self, folder: &str) -> HashSet<String> {
        let mut stmt = match self.conn.prepare(SELECT_TRANSFERRED_UIDS) {
            Ok(stmt) => stmt,
            Err(err) => {
                error!("cache query preparation failed for {folder}: {err}");
                return HashSet::new();
            }
        };
        let rows = stmt.query_map(params![folder], |row| row.get::<_, String>(0));
        match rows {
            Ok(rows) => rows.filter_map(Result::ok).collect(),
            Err(err) => {
                error!("cache query failed for {folder}: {err}");
                HashSet::new()
            }
        }
    }

    /// Durably record that `source_uid` has been transferred.
    ///
    /// Uses `INSERT OR IGNORE` so marking an already-transferred UID is a
    /// harmless no-op rather than a constraint violation. Each call is
    /// its own implicitly-committed statement, so a crash immediately
    /// after this returns never loses the record. A write failure is
    /// logged, not retried: the engine continues and will simply
    /// re-transfer this one message if the run is repeated.
    pub fn mark(&self, folder: &str, source_uid: &str, dest_uid: Option<&str>, message_size: Option<u64>) {
        let size = message_size.map(|s| i64::try_from(s).unwrap_or(i64::MAX));
        if let Err(err) = self
            .conn
            .execute(INSERT_MARK, params![folder, source_uid, dest_uid, size])
        {
            error!("failed to record transfer of {folder}/{source_uid} in cache: {err}");
        }
    }

    /// Count and total byte size of transferred messages, optionally
    /// scoped to one folder.
    #[must_use]
    pub fn stats(&self, folder: Option<&str>) -> CacheStats {
        let result = folder.map_or_else(
            || self.conn.query_row(STATS_ALL, [], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))),
            |folder| {
                self.conn
                    .query_row(STATS_FOLDER, params![folder], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
            },
        );
        match result {
            Ok((count, total_size)) => CacheStats {
                count: count.try_into().unwrap_or(0),
                total_size: total_size.try_into().unwrap_or(0),
            },
            Err(err) => {
                error!("cache stats query failed: {err}");
                CacheStats::default()
            }
        }
    }
}
