use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{current_streak, day_stats};
use crate::ledger::SessionRecord;

/// All-time totals shown on the progress view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySummary {
    pub total_sessions: u32,
    pub total_focus_minutes: u32,
    pub today_focus_minutes: u32,
    pub current_streak: u32,
    pub last_study_date: Option<NaiveDate>,
}

pub fn summary(sessions: &[SessionRecord], today: NaiveDate) -> StudySummary {
    StudySummary {
        total_sessions: u32::try_from(sessions.len()).unwrap_or(u32::MAX),
        total_focus_minutes: sessions
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.work_minutes)),
        today_focus_minutes: day_stats(sessions, today).total_focus_time,
        current_streak: current_streak(sessions.iter().map(|s| s.date), today),
        last_study_date: sessions.iter().map(|s| s.date).max(),
    }
}

/// Progress towards the daily study goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub focus_minutes: u32,
    pub goal_minutes: u32,
    /// 0.0..=100.0
    pub percent: f64,
    pub achieved: bool,
}

pub fn goal_progress(focus_minutes: u32, goal_minutes: u32) -> GoalProgress {
    let percent = if goal_minutes == 0 {
        100.0
    } else {
        (focus_minutes as f64 / goal_minutes as f64 * 100.0).min(100.0)
    };
    GoalProgress {
        focus_minutes,
        goal_minutes,
        percent,
        achieved: focus_minutes >= goal_minutes,
    }
}

/// `90` -> `"1h 30m"`, `60` -> `"1h"`, `45` -> `"45m"`.
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
