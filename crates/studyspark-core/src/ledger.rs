//! Session ledger: the durable list of completed work phases.
//!
//! The timer only needs [`SessionSink`] to append; statistics only need
//! [`SessionStore`] to read. [`InMemoryLedger`] implements both and is what
//! tests and embedded hosts use; [`crate::storage::Database`] is the SQLite
//! implementation.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::stats::{self, SessionStats, StudySummary};

/// A completed work phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub task_id: Option<String>,
    pub date: NaiveDate,
    /// Configured length of the phase, not wall-clock time.
    pub work_minutes: u32,
    /// One score per running second of the phase; empty if nothing was tracked.
    pub attention_timeline: Vec<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the timer hands to the ledger; id and timestamps are assigned on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub task_id: Option<String>,
    pub date: NaiveDate,
    pub work_minutes: u32,
    pub attention_timeline: Vec<f64>,
}

impl SessionRecord {
    /// Stamp a draft with a fresh v4 id and `now` for both timestamps.
    pub fn from_new(session: NewSession, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: session.task_id,
            date: session.date,
            work_minutes: session.work_minutes,
            attention_timeline: session.attention_timeline,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only write side of the ledger.
pub trait SessionSink {
    fn add_session(&mut self, session: NewSession) -> Result<SessionRecord>;
}

/// Read side of the ledger.
pub trait SessionStore {
    /// Every session in insertion order.
    fn sessions(&self) -> Result<Vec<SessionRecord>>;

    fn sessions_by_date(&self, date: NaiveDate) -> Result<Vec<SessionRecord>> {
        Ok(self
            .sessions()?
            .into_iter()
            .filter(|s| s.date == date)
            .collect())
    }

    fn session(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        Ok(self.sessions()?.into_iter().find(|s| s.id == id))
    }
}

/// Statistics queries available on any [`SessionStore`].
pub trait LedgerStats: SessionStore {
    /// `None` if the session is unknown or has no attention samples.
    fn session_stats(&self, id: Uuid) -> Result<Option<SessionStats>> {
        Ok(self.session(id)?.as_ref().and_then(stats::session_stats))
    }

    fn stats_for_date(&self, date: NaiveDate) -> Result<SessionStats> {
        Ok(stats::day_stats(&self.sessions_by_date(date)?, date))
    }

    fn today_stats(&self) -> Result<SessionStats> {
        self.stats_for_date(today())
    }

    fn current_streak(&self) -> Result<u32> {
        let sessions = self.sessions()?;
        Ok(stats::current_streak(sessions.iter().map(|s| s.date), today()))
    }

    fn summary(&self) -> Result<StudySummary> {
        Ok(stats::summary(&self.sessions()?, today()))
    }
}

impl<T: SessionStore + ?Sized> LedgerStats for T {}

/// The local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Ledger kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    sessions: Vec<SessionRecord>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.sessions
    }
}

impl SessionSink for InMemoryLedger {
    fn add_session(&mut self, session: NewSession) -> Result<SessionRecord> {
        let record = SessionRecord::from_new(session, Utc::now());
        self.sessions.push(record.clone());
        Ok(record)
    }
}

impl SessionStore for InMemoryLedger {
    fn sessions(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.sessions.clone())
    }

    fn sessions_by_date(&self, date: NaiveDate) -> Result<Vec<SessionRecord>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.date == date)
            .cloned()
            .collect())
    }
}
