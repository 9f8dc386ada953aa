use crate::metrics::local_date;
use crate::quiz_attempt::QuizAttempt;
use chrono::{DateTime, NaiveDate, TimeZone};
use std::collections::BTreeSet;

/// Distinct calendar dates (in `tz`) with at least one attempt, ascending
pub fn compute_active_days<Tz: TimeZone>(attempts: &[QuizAttempt], tz: &Tz) -> Vec<NaiveDate> {
    attempts
        .iter()
        .map(|a| local_date(&a.created_at, tz))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Calculate the number of consecutive active days ending today
///
/// - No history at all: 0
/// - Most recent active day is not today: 1 (a broken streak restarts at one)
/// - Otherwise: length of the unbroken run of days ending today
pub fn compute_streak<Tz: TimeZone>(attempts: &[QuizAttempt], now: &DateTime<Tz>) -> u32 {
    let days = compute_active_days(attempts, &now.timezone());
    streak_from_days(&days, now.date_naive())
}

/// Streak over already-extracted active days (ascending, distinct)
pub fn streak_from_days(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&latest) = days.last() else {
        return 0;
    };
    if latest != today {
        return 1;
    }

    let mut streak = 1;
    for pair in days.windows(2).rev() {
        if pair[0].succ_opt() == Some(pair[1]) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Longest run of consecutive days anywhere in `days` (ascending, distinct)
pub fn longest_run(days: &[NaiveDate]) -> u32 {
    if days.is_empty() {
        return 0;
    }
    let mut longest = 1;
    let mut current = 1;
    for pair in days.windows(2) {
        if pair[0].succ_opt() == Some(pair[1]) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 1;
        }
    }
    longest
}
