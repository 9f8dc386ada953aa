//! Dashboard statistics derived from a user's quiz attempt history.
//!
//! Every function here is pure: the attempt list and the current time are passed in,
//! and calendar days are taken in the time zone of that current time.

pub mod counts;
pub mod deltas;
pub mod service;
pub mod streak;
pub mod subjects;
pub mod weekly;

use crate::quiz_attempt::QuizAttempt;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::Serialize;

pub use counts::{QuizCounts, compute_average_score, compute_chapters_completed, compute_quiz_counts};
pub use deltas::{Deltas, compute_deltas};
pub use service::MetricsService;
pub use streak::{compute_active_days, compute_streak};
pub use subjects::{
    SubjectExtremes, SubjectProgress, compute_strongest_and_weakest, compute_subject_progress,
};
pub use weekly::{DailyScore, compute_weekly_breakdown, compute_weekly_progress};

/// How many attempts the recent-quizzes list keeps
pub const RECENT_QUIZZES: usize = 4;

/// Snapshot of every dashboard statistic for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub user_id: String,
    /// Calendar date the snapshot was computed for
    pub as_of: NaiveDate,
    /// Offset calendar days were taken in
    #[serde(skip)]
    pub utc_offset: FixedOffset,
    pub quizzes_attempted: usize,
    pub total_questions_solved: u64,
    pub total_correct: u64,
    pub total_wrong: u64,
    pub average_score: u32,
    pub weekly_progress: Vec<u32>,
    pub weekly_breakdown: Vec<DailyScore>,
    pub subject_progress: Vec<SubjectProgress>,
    pub current_streak: u32,
    pub strongest_subject: Option<String>,
    pub improvement_needed: Option<String>,
    pub deltas: Deltas,
    pub recent_quizzes: Vec<QuizAttempt>,
    pub chapters_completed: Vec<String>,
    pub active_days: Vec<NaiveDate>,
}

/// Compute the full metrics snapshot for `user_id` from their attempt history
pub fn compute_metrics<Tz: TimeZone>(
    user_id: &str,
    attempts: &[QuizAttempt],
    now: &DateTime<Tz>,
) -> DerivedMetrics {
    let counts = compute_quiz_counts(attempts);
    let weekly_breakdown = compute_weekly_breakdown(attempts, now);
    let subject_progress = compute_subject_progress(attempts);
    let extremes = compute_strongest_and_weakest(&subject_progress);
    let active_days = compute_active_days(attempts, &now.timezone());
    let current_streak = streak::streak_from_days(&active_days, now.date_naive());

    let mut recent_quizzes = attempts.to_vec();
    recent_quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_quizzes.truncate(RECENT_QUIZZES);

    DerivedMetrics {
        user_id: user_id.to_string(),
        as_of: now.date_naive(),
        utc_offset: now.offset().fix(),
        quizzes_attempted: counts.count,
        total_questions_solved: counts.total_questions,
        total_correct: counts.total_correct,
        total_wrong: counts.total_wrong,
        average_score: compute_average_score(attempts),
        weekly_progress: weekly_breakdown.iter().map(|d| d.average_score).collect(),
        weekly_breakdown,
        subject_progress,
        current_streak,
        strongest_subject: extremes.strongest,
        improvement_needed: extremes.weakest,
        deltas: compute_deltas(attempts, now),
        recent_quizzes,
        chapters_completed: compute_chapters_completed(attempts),
        active_days,
    }
}

/// Calendar date of a stored UTC timestamp as seen in `tz`
pub(crate) fn local_date<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// `total / count` rounded to the nearest integer, halves rounding up; 0 when empty
pub(crate) fn round_average(total: u64, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u32
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::quiz_attempt::QuizAttempt;
    use chrono::{DateTime, NaiveDate, Utc};

    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .and_utc()
    }

    pub fn attempt_at(created_at: DateTime<Utc>, score: u32, chapter: Option<&str>) -> QuizAttempt {
        QuizAttempt {
            id: created_at.timestamp_millis(),
            user_id: "student-1".to_string(),
            subject: None,
            chapter: chapter.map(str::to_string),
            score,
            correct_answers: score / 10,
            wrong_answers: 10 - score / 10,
            total_questions: 10,
            time_taken_seconds: 300,
            created_at,
        }
    }

    pub fn attempt_on(date: (i32, u32, u32), score: u32, chapter: Option<&str>) -> QuizAttempt {
        attempt_at(at(date.0, date.1, date.2, 10, 0), score, chapter)
    }
}
