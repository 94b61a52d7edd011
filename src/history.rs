use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::app_dirs::AppDirs;

/// One completed session, as stored in the history ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub played_at: DateTime<Local>,
    pub duration_secs: u32,
    pub score: u32,
    pub resolved: u32,
    pub spawned: u32,
    pub healing_resolved: u32,
}

/// Aggregates across the whole ledger, for the history screen header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryTotals {
    pub sessions: u32,
    pub resolved: u32,
    pub best_score: u32,
}

/// SQLite-backed session history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (or create) the history database under the user state dir
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("sana_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::init(Connection::open(&db_path)?)
    }

    /// In-memory database for tests and throwaway runs
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                played_at TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                score INTEGER NOT NULL,
                resolved INTEGER NOT NULL,
                spawned INTEGER NOT NULL,
                healing_resolved INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_played_at ON sessions(played_at)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record_session(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (played_at, duration_secs, score, resolved, spawned, healing_resolved)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.played_at.to_rfc3339(),
                record.duration_secs,
                record.score,
                record.resolved,
                record.spawned,
                record.healing_resolved,
            ],
        )?;

        Ok(())
    }

    /// Most recent sessions, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        self.fetch(
            r#"
            SELECT played_at, duration_secs, score, resolved, spawned, healing_resolved
            FROM sessions
            ORDER BY played_at DESC
            LIMIT ?1
            "#,
            Some(limit),
        )
    }

    fn all(&self) -> Result<Vec<SessionRecord>> {
        self.fetch(
            r#"
            SELECT played_at, duration_secs, score, resolved, spawned, healing_resolved
            FROM sessions
            ORDER BY played_at DESC
            "#,
            None,
        )
    }

    fn fetch(&self, sql: &str, limit: Option<usize>) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(sql)?;

        let map_row = |row: &rusqlite::Row| {
            let played_at_str: String = row.get(0)?;
            let played_at = DateTime::parse_from_rfc3339(&played_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "played_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(SessionRecord {
                played_at,
                duration_secs: row.get(1)?,
                score: row.get(2)?,
                resolved: row.get(3)?,
                spawned: row.get(4)?,
                healing_resolved: row.get(5)?,
            })
        };

        let record_iter = match limit {
            Some(limit) => stmt.query_map([limit], map_row)?,
            None => stmt.query_map([], map_row)?,
        };

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }

        Ok(records)
    }

    pub fn totals(&self) -> Result<HistoryTotals> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(resolved), 0),
                COALESCE(MAX(score), 0)
            FROM sessions
            "#,
        )?;

        stmt.query_row([], |row| {
            Ok(HistoryTotals {
                sessions: row.get(0)?,
                resolved: row.get(1)?,
                best_score: row.get(2)?,
            })
        })
    }

    /// Write the whole ledger to a CSV file; returns the number of rows
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize, Box<dyn std::error::Error>> {
        let records = self.all()?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "played_at",
            "duration_secs",
            "score",
            "resolved",
            "spawned",
            "healing_resolved",
        ])?;

        for record in &records {
            writer.write_record([
                record.played_at.to_rfc3339(),
                record.duration_secs.to_string(),
                record.score.to_string(),
                record.resolved.to_string(),
                record.spawned.to_string(),
                record.healing_resolved.to_string(),
            ])?;
        }
        writer.flush()?;

        Ok(records.len())
    }
}

/// "3 hours ago" style rendering for the history screen
pub fn humanize_since(when: DateTime<Local>) -> String {
    let elapsed = Local::now()
        .signed_duration_since(when)
        .to_std()
        .unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}
