// # History Store
//
// SQLite-backed persistence for the IP observation history.
//
// ## Collections
//
// - `public_ip`: observation periods (append, or advance `last_time_seen`)
// - `gap`: abnormally long intervals between successful samples (append-only)
// - `errors`: failed resolution attempts (append-only)
//
// ## Write discipline
//
// `ip` and `first_time_seen` are write-once. No update or delete ever
// applies to `gap` or `errors` rows. The store assumes a single writer and
// relies on SQLite's own transaction/durability guarantees; callers must
// `close()` the handle before process exit.

use std::net::Ipv4Addr;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A contiguous span during which the public IP was believed unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPeriod {
    /// Monotonically assigned row id
    pub id: i64,
    /// The observed address, immutable once set
    pub ip: Ipv4Addr,
    /// Period start, immutable
    pub first_seen: f64,
    /// Most recent confirming sample, monotonically non-decreasing
    pub last_seen: f64,
}

impl ObservationPeriod {
    /// Duration the address was observed for, in seconds
    pub fn duration_secs(&self) -> f64 {
        self.last_seen - self.first_seen
    }
}

/// A persisted record of a suspiciously large interval between two
/// consecutive successful samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapEvent {
    pub id: i64,
    /// Previous period's `last_seen` before the sample that exposed the gap
    pub start: f64,
    /// The sample time that exposed the gap
    pub end: f64,
    pub reason: Option<String>,
}

/// A persisted record of a failed resolution attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub id: i64,
    pub timestamp: f64,
    pub message: String,
}

/// SQLite-backed history store
///
/// Owns the single connection for the process. All operations are
/// individually atomic with respect to the single writer.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (or create) the history database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::store(format!("open {}: {}", path.as_ref().display(), e)))?;
        let store = Self { conn };
        store.ensure_schema()?;
        tracing::debug!("history store opened: {}", path.as_ref().display());
        Ok(store)
    }

    /// Open an in-memory history database (tests, demos)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("open in-memory store: {}", e)))?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS public_ip (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                ip              TEXT NOT NULL,
                first_time_seen REAL NOT NULL,
                last_time_seen  REAL NOT NULL,
                CHECK (last_time_seen >= first_time_seen)
            );
            CREATE INDEX IF NOT EXISTS idx_public_ip_last_seen
                ON public_ip(last_time_seen DESC);

            CREATE TABLE IF NOT EXISTS gap (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                start  REAL NOT NULL,
                "end"  REAL NOT NULL,
                reason TEXT
            );

            CREATE TABLE IF NOT EXISTS errors (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                unix_time_stamp REAL NOT NULL,
                error           TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    // =========================================================================
    // Write operations
    // =========================================================================

    /// Append a new observation period with `first_seen = last_seen = t`.
    /// Returns the assigned identifier.
    pub fn insert_period(&self, ip: Ipv4Addr, t: f64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO public_ip (ip, first_time_seen, last_time_seen) VALUES (?1, ?2, ?3)",
            params![ip.to_string(), t, t],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Advance `last_seen` for the given period. Returns rows affected;
    /// under correct operation this is exactly 1.
    pub fn touch_period(&self, id: i64, t: f64) -> Result<usize> {
        let affected = self.conn.execute(
            "UPDATE public_ip SET last_time_seen = ?1 WHERE id = ?2",
            params![t, id],
        )?;
        Ok(affected)
    }

    /// Append a gap event. Append-only; gap rows are never mutated.
    pub fn insert_gap(&self, start: f64, end: f64, reason: Option<&str>) -> Result<i64> {
        self.conn.execute(
            r#"INSERT INTO gap (start, "end", reason) VALUES (?1, ?2, ?3)"#,
            params![start, end, reason],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append an error event. Append-only; error rows are never mutated.
    pub fn insert_error(&self, t: f64, message: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO errors (unix_time_stamp, error) VALUES (?1, ?2)",
            params![t, message],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // =========================================================================
    // Read operations
    // =========================================================================

    /// The period with the maximum `last_seen`, or `None` if the store is
    /// empty. Equal timestamps (single writer, monotonic clock: should not
    /// occur) break deterministically toward the highest id.
    pub fn current_period(&self) -> Result<Option<ObservationPeriod>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, ip, first_time_seen, last_time_seen FROM public_ip
                 ORDER BY last_time_seen DESC, id DESC LIMIT 1",
                [],
                Self::map_period,
            )
            .optional()?;
        row.map(Self::parse_period).transpose()
    }

    /// All observation periods, ascending by `last_seen`
    pub fn list_periods(&self, limit: Option<usize>) -> Result<Vec<ObservationPeriod>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ip, first_time_seen, last_time_seen FROM public_ip
             ORDER BY last_time_seen ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![Self::sql_limit(limit)], Self::map_period)?;
        rows.map(|r| Self::parse_period(r?)).collect()
    }

    /// All gap events, newest first
    pub fn list_gaps(&self, limit: Option<usize>) -> Result<Vec<GapEvent>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT id, start, "end", reason FROM gap ORDER BY "end" DESC LIMIT ?1"#,
        )?;
        let rows = stmt.query_map(params![Self::sql_limit(limit)], |row| {
            Ok(GapEvent {
                id: row.get(0)?,
                start: row.get(1)?,
                end: row.get(2)?,
                reason: row.get(3)?,
            })
        })?;
        rows.collect::<rusqlite::Result<_>>().map_err(Into::into)
    }

    /// All error events, newest first
    pub fn list_errors(&self, limit: Option<usize>) -> Result<Vec<ErrorEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, unix_time_stamp, error FROM errors
             ORDER BY unix_time_stamp DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![Self::sql_limit(limit)], |row| {
            Ok(ErrorEvent {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                message: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<_>>().map_err(Into::into)
    }

    /// Number of observation periods recorded so far
    pub fn count_periods(&self) -> Result<u64> {
        self.count("public_ip")
    }

    /// Number of gap events recorded so far
    pub fn count_gaps(&self) -> Result<u64> {
        self.count("gap")
    }

    /// Number of error events recorded so far
    pub fn count_errors(&self) -> Result<u64> {
        self.count("errors")
    }

    fn count(&self, table: &str) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(n as u64)
    }

    /// Close the underlying connection, flushing any pending state
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| Error::store(format!("close history store: {}", e)))
    }

    // negative LIMIT means "no limit" in SQLite
    fn sql_limit(limit: Option<usize>) -> i64 {
        limit.map(|n| n as i64).unwrap_or(-1)
    }

    fn map_period(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, f64, f64)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn parse_period((id, ip, first_seen, last_seen): (i64, String, f64, f64)) -> Result<ObservationPeriod> {
        let ip = ip
            .parse::<Ipv4Addr>()
            .map_err(|e| Error::store(format!("row {} holds invalid ip {:?}: {}", id, ip, e)))?;
        Ok(ObservationPeriod {
            id,
            ip,
            first_seen,
            last_seen,
        })
    }
}
