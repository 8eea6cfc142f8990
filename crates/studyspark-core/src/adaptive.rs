//! Attention-adaptive work duration.
//!
//! Given the attention timeline of the work phase that just ended, recommend
//! the length of the next one. The timer never calls this on its own; the
//! host decides whether to write the recommendation back into the settings
//! before the next work phase begins.

use crate::settings::Settings;

/// Below this average the next work phase is shortened.
pub const LOW_ATTENTION: f64 = 0.6;
/// Above this average the next work phase is lengthened.
pub const HIGH_ATTENTION: f64 = 0.9;
/// Shortest work phase the advisor will recommend.
pub const MIN_WORK_MINUTES: u32 = 20;
/// Longest work phase the advisor will recommend.
pub const MAX_WORK_MINUTES: u32 = 35;
/// Size of one adjustment.
pub const STEP_MINUTES: u32 = 5;

/// Mean of the timeline, `None` when it is empty.
pub fn average_attention(timeline: &[f64]) -> Option<f64> {
    if timeline.is_empty() {
        return None;
    }
    Some(timeline.iter().sum::<f64>() / timeline.len() as f64)
}

/// Recommended work minutes for the next phase.
///
/// Returns `settings.work_minutes` unchanged when adaptation is disabled, the
/// timeline is empty, or the average lies in `[0.6, 0.9]`.
pub fn recommend(timeline: &[f64], settings: &Settings) -> u32 {
    if !settings.adaptive_enabled {
        return settings.work_minutes;
    }
    match average_attention(timeline) {
        Some(avg) => recommend_for_average(avg, settings.work_minutes),
        None => settings.work_minutes,
    }
}

/// The threshold policy on its own, for callers that already have an average.
pub fn recommend_for_average(avg: f64, work_minutes: u32) -> u32 {
    if avg < LOW_ATTENTION {
        work_minutes.saturating_sub(STEP_MINUTES).max(MIN_WORK_MINUTES)
    } else if avg > HIGH_ATTENTION {
        work_minutes.saturating_add(STEP_MINUTES).min(MAX_WORK_MINUTES)
    } else {
        work_minutes
    }
}

/// User-facing note about a changed duration, `None` when nothing changed.
pub fn adjustment_message(avg: f64, new_minutes: u32, old_minutes: u32) -> Option<String> {
    let pct = (avg * 100.0).round();
    if new_minutes == old_minutes {
        None
    } else if new_minutes < old_minutes {
        Some(format!(
            "Your attention was {pct}%. Next session shortened to {new_minutes} minutes."
        ))
    } else {
        Some(format!(
            "Great focus! ({pct}%) Next session extended to {new_minutes} minutes."
        ))
    }
}
