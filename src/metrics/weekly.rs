use crate::metrics::{local_date, round_average};
use crate::quiz_attempt::QuizAttempt;
use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::Serialize;

/// Number of calendar days in the weekly series
pub const WEEK_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub attempts: usize,
    pub average_score: u32,
}

/// Per-day attempt counts and rounded average scores for the 7 calendar days ending
/// at `now`, oldest first. Day boundaries follow the calendar of `now`'s time zone.
pub fn compute_weekly_breakdown<Tz: TimeZone>(
    attempts: &[QuizAttempt],
    now: &DateTime<Tz>,
) -> Vec<DailyScore> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..WEEK_DAYS as u64)
        .rev()
        .filter_map(|days_back| today.checked_sub_days(Days::new(days_back)))
        .map(|date| {
            let (count, total) = attempts
                .iter()
                .filter(|a| local_date(&a.created_at, &tz) == date)
                .fold((0usize, 0u64), |(count, total), a| {
                    (count + 1, total + u64::from(a.score))
                });
            DailyScore {
                date,
                attempts: count,
                average_score: round_average(total, count),
            }
        })
        .collect()
}

/// The 7 daily average scores ending at `now`, oldest first; 0 for days without attempts
pub fn compute_weekly_progress<Tz: TimeZone>(
    attempts: &[QuizAttempt],
    now: &DateTime<Tz>,
) -> Vec<u32> {
    compute_weekly_breakdown(attempts, now)
        .into_iter()
        .map(|day| day.average_score)
        .collect()
}
