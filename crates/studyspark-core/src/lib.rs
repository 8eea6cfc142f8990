//! # StudySpark Core Library
//!
//! Core logic for the StudySpark study-session tracker. Every operation is
//! available through the standalone `studyspark` CLI, which is a thin host
//! over this crate.
//!
//! ## Architecture
//!
//! - **Phase timer**: a work/break state machine driven by an injected
//!   [`timer::Clock`]. The caller feeds it ticks; the timer never reads the
//!   wall clock on its own.
//! - **Attention**: per-second focus samples buffered during work phases and
//!   flushed into the ledger when a work phase ends.
//! - **Ledger**: append-only session records, in memory or in SQLite.
//! - **Adaptive advisor**: recommends the next work duration from a
//!   session's attention timeline.
//! - **Stats**: pure functions over session records (per-session, per-day,
//!   streak, summary, daily goal).
//!
//! ## Key Components
//!
//! - [`PhaseTimer`]: the timer state machine
//! - [`StudyContext`]: settings + ledger + attention buffer passed to it
//! - [`Database`]: SQLite session ledger
//! - [`Config`]: TOML configuration

pub mod adaptive;
pub mod attention;
pub mod error;
pub mod events;
pub mod ledger;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use attention::{AttentionBuffer, AttentionSource};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use ledger::{InMemoryLedger, LedgerStats, NewSession, SessionRecord, SessionSink, SessionStore};
pub use settings::{Settings, StudyMethod};
pub use stats::{GoalProgress, SessionStats, StudySummary};
pub use storage::{Config, Database, GoalsConfig};
pub use timer::{ManualClock, Phase, PhaseTimer, StudyContext, TimerContext, TimerStatus, TokioClock};
