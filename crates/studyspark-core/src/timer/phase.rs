use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Segment of the study cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Focus Time",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
            Phase::Idle => "Ready",
        }
    }

    /// Configured minutes for this phase; 0 for `Idle`.
    pub fn minutes(&self, settings: &Settings) -> u32 {
        match self {
            Phase::Work => settings.work_minutes,
            Phase::ShortBreak => settings.short_break_minutes,
            Phase::LongBreak => settings.long_break_minutes,
            Phase::Idle => 0,
        }
    }

    pub fn duration_secs(&self, settings: &Settings) -> u64 {
        self.minutes(settings) as u64 * 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// `MM:SS`; minutes keep counting past 59.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
