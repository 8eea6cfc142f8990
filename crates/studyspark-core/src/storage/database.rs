//! SQLite-based session ledger.
//!
//! Provides persistent storage for completed study sessions, including the
//! per-second attention timeline (stored as a JSON array).

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::ledger::{NewSession, SessionRecord, SessionSink, SessionStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SESSION_COLUMNS: &str =
    "id, task_id, date, work_minutes, attention_timeline, created_at, updated_at";

/// Raw column values before decoding.
type SessionRow = (String, Option<String>, String, u32, String, String, String);

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/studyspark.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("studyspark.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        debug!(path = %path.display(), "Opened session database");
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral hosts).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id                 TEXT PRIMARY KEY,
                    task_id            TEXT,
                    date               TEXT NOT NULL,
                    work_minutes       INTEGER NOT NULL,
                    attention_timeline TEXT NOT NULL DEFAULT '[]',
                    created_at         TEXT NOT NULL,
                    updated_at         TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Insert a fully formed record, e.g. one imported from another store.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including duplicate ids).
    pub fn insert_record(&self, record: &SessionRecord) -> Result<()> {
        let timeline = serde_json::to_string(&record.attention_timeline)?;
        self.conn
            .execute(
                "INSERT INTO sessions (id, task_id, date, work_minutes, attention_timeline, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.to_string(),
                    record.task_id,
                    record.date.format(DATE_FORMAT).to_string(),
                    record.work_minutes,
                    timeline,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn query_sessions(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(sql).map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(args, read_row)
            .map_err(DatabaseError::from)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(decode_row(row.map_err(DatabaseError::from)?)?);
        }
        Ok(sessions)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_row(row: SessionRow) -> Result<SessionRecord> {
    let (id, task_id, date, work_minutes, timeline, created_at, updated_at) = row;
    let corrupt = |message: String| DatabaseError::CorruptRow {
        table: "sessions".to_string(),
        message,
    };

    Ok(SessionRecord {
        id: Uuid::parse_str(&id).map_err(|e| corrupt(format!("id '{id}': {e}")))?,
        task_id,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| corrupt(format!("date '{date}': {e}")))?,
        work_minutes,
        attention_timeline: serde_json::from_str(&timeline)
            .map_err(|e| corrupt(format!("attention_timeline: {e}")))?,
        created_at: parse_timestamp(&created_at).map_err(corrupt)?,
        updated_at: parse_timestamp(&updated_at).map_err(corrupt)?,
    })
}

fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("timestamp '{value}': {e}"))
}

impl SessionSink for Database {
    fn add_session(&mut self, session: NewSession) -> Result<SessionRecord> {
        let record = SessionRecord::from_new(session, Utc::now());
        self.insert_record(&record)?;
        Ok(record)
    }
}

impl SessionStore for Database {
    fn sessions(&self) -> Result<Vec<SessionRecord>> {
        self.query_sessions(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY rowid"),
            &[],
        )
    }

    fn sessions_by_date(&self, date: NaiveDate) -> Result<Vec<SessionRecord>> {
        let day = date.format(DATE_FORMAT).to_string();
        self.query_sessions(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE date = ?1 ORDER BY rowid"
            ),
            &[&day as &dyn rusqlite::ToSql],
        )
    }

    fn session(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id.to_string()],
                read_row,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        row.map(decode_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerStats;

    fn draft(date: NaiveDate, minutes: u32, timeline: Vec<f64>) -> NewSession {
        NewSession {
            task_id: Some("algebra".into()),
            date,
            work_minutes: minutes,
            attention_timeline: timeline,
        }
    }

    #[test]
    fn record_and_query() {
        let mut db = Database::open_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        let record = db.add_session(draft(day, 25, vec![0.5, 0.75])).unwrap();

        let all = db.sessions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], record);
    }

    #[test]
    fn sessions_by_date_filters_exact_day() {
        let mut db = Database::open_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        let other = NaiveDate::from_ymd_opt(2025, 4, 3).unwrap();
        db.add_session(draft(day, 25, vec![])).unwrap();
        db.add_session(draft(other, 25, vec![])).unwrap();
        db.add_session(draft(day, 50, vec![])).unwrap();

        let found = db.sessions_by_date(day).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].work_minutes, 25);
        assert_eq!(found[1].work_minutes, 50);
    }

    #[test]
    fn session_lookup_by_id() {
        let mut db = Database::open_memory().unwrap();
        let record = db
            .add_session(draft(crate::ledger::today(), 2, vec![0.9; 120]))
            .unwrap();

        assert_eq!(db.session(record.id).unwrap(), Some(record.clone()));
        assert_eq!(db.session(Uuid::new_v4()).unwrap(), None);

        let stats = db.session_stats(record.id).unwrap().unwrap();
        assert_eq!(stats.total_focus_time, 2);
        assert_eq!(stats.attention_score, 90);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut db = Database::open_memory().unwrap();
        let record = db
            .add_session(draft(crate::ledger::today(), 25, vec![]))
            .unwrap();
        assert!(db.insert_record(&record).is_err());
    }

    #[test]
    fn corrupt_rows_surface_as_errors() {
        let db = Database::open_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO sessions (id, date, work_minutes, created_at, updated_at)
                 VALUES ('not-a-uuid', '2025-01-01', 25, 'x', 'y')",
                [],
            )
            .unwrap();
        assert!(db.sessions().is_err());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyspark.db");
        let day = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        {
            let mut db = Database::open_at(&path).unwrap();
            db.add_session(draft(day, 25, vec![0.25])).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        let all = db.sessions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].attention_timeline, vec![0.25]);
        assert_eq!(all[0].task_id.as_deref(), Some("algebra"));
    }
}
