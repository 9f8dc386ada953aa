use crate::metrics::local_date;
use crate::quiz_attempt::QuizAttempt;
use chrono::{DateTime, Days, TimeZone};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Deltas {
    /// Attempts in the 7 days ending today
    pub quizzes_this_week: usize,
    /// Attempts in the 7 days before that
    pub quizzes_last_week: usize,
    pub quizzes_delta_last_week: i64,
    pub questions_today: u64,
    pub questions_yesterday: u64,
    pub questions_delta_yesterday: i64,
}

/// Week-over-week attempt counts and day-over-day questions solved, on the calendar
/// of `now`'s time zone. Attempts dated after today fall in neither window.
pub fn compute_deltas<Tz: TimeZone>(attempts: &[QuizAttempt], now: &DateTime<Tz>) -> Deltas {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.checked_sub_days(Days::new(1));
    let week_start = today.checked_sub_days(Days::new(6));
    let last_week_start = today.checked_sub_days(Days::new(13));

    let mut deltas = Deltas::default();
    for attempt in attempts {
        let date = local_date(&attempt.created_at, &tz);
        if date > today {
            continue;
        }
        if week_start.is_none_or(|start| date >= start) {
            deltas.quizzes_this_week += 1;
        } else if last_week_start.is_none_or(|start| date >= start) {
            deltas.quizzes_last_week += 1;
        }
        if date == today {
            deltas.questions_today += u64::from(attempt.total_questions);
        } else if Some(date) == yesterday {
            deltas.questions_yesterday += u64::from(attempt.total_questions);
        }
    }

    deltas.quizzes_delta_last_week =
        deltas.quizzes_this_week as i64 - deltas.quizzes_last_week as i64;
    deltas.questions_delta_yesterday =
        deltas.questions_today as i64 - deltas.questions_yesterday as i64;
    deltas
}
