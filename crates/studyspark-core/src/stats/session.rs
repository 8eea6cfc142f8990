use serde::{Deserialize, Serialize};

use super::attention_percent;
use crate::ledger::SessionRecord;

const SAMPLES_PER_MINUTE: usize = 60;

/// Summary of one session or one day of sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Focus minutes (configured phase lengths).
    pub total_focus_time: u32,
    pub cycles_completed: u32,
    /// Mean attention as a percentage, 0..=100.
    pub attention_score: u32,
    /// 0-indexed minute with the lowest mean attention.
    pub most_distracted_minute: Option<u32>,
}

/// Stats for a single session, `None` when it has no attention samples.
pub fn session_stats(session: &SessionRecord) -> Option<SessionStats> {
    let timeline = &session.attention_timeline;
    if timeline.is_empty() {
        return None;
    }

    Some(SessionStats {
        total_focus_time: session.work_minutes,
        cycles_completed: 1,
        attention_score: attention_percent(timeline.iter().sum(), timeline.len()),
        most_distracted_minute: most_distracted_minute(timeline, session.work_minutes),
    })
}

/// Index of the 60-sample window with the lowest mean.
///
/// Windows are `[m*60, m*60+60)` for `m` in `0..work_minutes`; windows with no
/// samples are skipped. The first minimum wins on ties.
/// A fully attentive timeline still names a minute (`Some(0)` for all 1.0
/// scores); there is no upper cap that would make it `None`.
pub fn most_distracted_minute(timeline: &[f64], work_minutes: u32) -> Option<u32> {
    let mut lowest: Option<(u32, f64)> = None;

    for minute in 0..work_minutes {
        let start = minute as usize * SAMPLES_PER_MINUTE;
        if start >= timeline.len() {
            break;
        }
        let end = (start + SAMPLES_PER_MINUTE).min(timeline.len());
        let window = &timeline[start..end];
        let mean = window.iter().sum::<f64>() / window.len() as f64;

        match lowest {
            Some((_, best)) if mean >= best => {}
            _ => lowest = Some((minute, mean)),
        }
    }

    lowest.map(|(minute, _)| minute)
}
