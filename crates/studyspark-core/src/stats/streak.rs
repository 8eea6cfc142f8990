use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Consecutive study days ending at the most recent one.
///
/// The streak is alive only if the most recent study day is `today` or the
/// day before; otherwise it is 0. Duplicate dates are fine.
pub fn current_streak<I>(study_days: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = study_days.into_iter().collect();

    let Some(&latest) = days.iter().next_back() else {
        return 0;
    };
    if latest != today && latest != today - Duration::days(1) {
        return 0;
    }

    let mut streak = 0;
    let mut expected = latest;
    for &day in days.iter().rev() {
        if day != expected {
            break;
        }
        streak += 1;
        expected = day - Duration::days(1);
    }
    streak
}
