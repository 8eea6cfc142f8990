use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::{attention_percent, SessionStats};
use crate::ledger::SessionRecord;

/// Aggregate the sessions recorded on `date`.
///
/// Sessions on other days are ignored, so the whole ledger can be passed in.
/// Sessions with empty timelines add focus time and a cycle but no attention
/// samples. The most-distracted minute is not computed for a day.
pub fn day_stats(sessions: &[SessionRecord], date: NaiveDate) -> SessionStats {
    let mut stats = SessionStats::default();
    let mut sample_sum = 0.0;
    let mut sample_count = 0usize;

    for session in sessions.iter().filter(|s| s.date == date) {
        stats.total_focus_time = stats.total_focus_time.saturating_add(session.work_minutes);
        stats.cycles_completed = stats.cycles_completed.saturating_add(1);
        sample_sum += session.attention_timeline.iter().sum::<f64>();
        sample_count += session.attention_timeline.len();
    }

    stats.attention_score = attention_percent(sample_sum, sample_count);
    stats
}

/// Sessions keyed by calendar day, oldest first.
pub fn group_by_date(sessions: &[SessionRecord]) -> BTreeMap<NaiveDate, Vec<&SessionRecord>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&SessionRecord>> = BTreeMap::new();
    for session in sessions {
        groups.entry(session.date).or_default().push(session);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NewSession;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn record(date: NaiveDate, minutes: u32, timeline: Vec<f64>) -> SessionRecord {
        SessionRecord::from_new(
            NewSession {
                task_id: None,
                date,
                work_minutes: minutes,
                attention_timeline: timeline,
            },
            Utc::now(),
        )
    }

    #[test]
    fn no_sessions_is_zeroed() {
        let stats = day_stats(&[], day(1));
        assert_eq!(stats, SessionStats::default());
        assert_eq!(stats.most_distracted_minute, None);
    }

    #[test]
    fn sums_focus_and_counts_cycles() {
        let sessions = vec![
            record(day(2), 25, vec![1.0, 1.0]),
            record(day(2), 30, vec![0.5, 0.5]),
            record(day(1), 90, vec![0.0]),
        ];
        let stats = day_stats(&sessions, day(2));
        assert_eq!(stats.total_focus_time, 55);
        assert_eq!(stats.cycles_completed, 2);
        assert_eq!(stats.attention_score, 75);
        assert_eq!(stats.most_distracted_minute, None);
    }

    #[test]
    fn empty_timelines_do_not_count_as_zero_attention() {
        let sessions = vec![
            record(day(3), 25, vec![0.8, 0.8, 0.8, 0.8]),
            record(day(3), 25, vec![]),
        ];
        let stats = day_stats(&sessions, day(3));
        assert_eq!(stats.cycles_completed, 2);
        assert_eq!(stats.total_focus_time, 50);
        assert_eq!(stats.attention_score, 80);
    }

    #[test]
    fn day_with_only_untracked_sessions_scores_zero() {
        let sessions = vec![record(day(4), 25, vec![])];
        let stats = day_stats(&sessions, day(4));
        assert_eq!(stats.cycles_completed, 1);
        assert_eq!(stats.attention_score, 0);
    }

    #[test]
    fn focus_time_saturates_instead_of_overflowing() {
        let half = u32::MAX / 2 + 1;
        let sessions = vec![record(day(3), half, vec![]), record(day(3), half, vec![])];
        let stats = day_stats(&sessions, day(3));
        assert_eq!(stats.total_focus_time, u32::MAX);
        assert_eq!(stats.cycles_completed, 2);
    }

    #[test]
    fn groups_sessions_by_day() {
        let sessions = vec![
            record(day(2), 25, vec![]),
            record(day(1), 25, vec![]),
            record(day(2), 25, vec![]),
        ];
        let groups = group_by_date(&sessions);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&day(2)].len(), 2);
        assert_eq!(groups.keys().next(), Some(&day(1)));
    }
}
