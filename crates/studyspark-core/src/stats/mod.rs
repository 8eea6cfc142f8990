//! Statistics for StudySpark sessions.
//!
//! Everything here is a pure function over ledger records. "Today" is always
//! passed in so callers (and tests) control the calendar.

mod daily;
mod session;
mod streak;
mod summary;

pub use daily::{day_stats, group_by_date};
pub use session::{most_distracted_minute, session_stats, SessionStats};
pub use streak::current_streak;
pub use summary::{format_duration, goal_progress, summary, GoalProgress, StudySummary};

/// Average attention as a whole percentage, rounding half away from zero.
pub(crate) fn attention_percent(sum: f64, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    (sum / count as f64 * 100.0).round().max(0.0) as u32
}
