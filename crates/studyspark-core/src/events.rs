use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{Phase, TimerStatus};

/// Every timer state change produces an Event.
/// Hosts print, log or forward them; the timer keeps no event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        duration_secs: u64,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        time_remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        time_remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ended, by countdown or skip, and the next one is loaded.
    PhaseAdvanced {
        from: Phase,
        to: Phase,
        cycles_completed: u32,
        duration_secs: u64,
        /// Ledger entry written when a work phase ended; `None` after a break
        /// or if the ledger rejected the write.
        session_id: Option<Uuid>,
        skipped: bool,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        status: TimerStatus,
        phase_label: String,
        time_remaining_secs: u64,
        /// `MM:SS`
        clock: String,
        progress_pct: f64,
        cycles_completed: u32,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::TimerReset { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "timer_reset");

        let event = Event::PhaseAdvanced {
            from: Phase::Work,
            to: Phase::LongBreak,
            cycles_completed: 4,
            duration_secs: 900,
            session_id: None,
            skipped: false,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_advanced");
        assert_eq!(json["to"], "long_break");
        assert!(json["session_id"].is_null());
    }
}
