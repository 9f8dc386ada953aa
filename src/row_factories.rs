use crate::quiz_attempt::QuizAttempt;
use crate::study_session::StudySession;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

/// Timestamps are stored as RFC 3339 UTC text with millisecond precision, so that
/// comparing the text compares the instants
pub fn to_db_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp, reporting failures as a conversion error on `column`
pub fn parse_db_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Factory for creating QuizAttempt objects from database rows
pub struct QuizAttemptRowFactory;

impl QuizAttemptRowFactory {
    /// Creates a QuizAttempt from a database row
    /// Expected columns: id, user_id, subject, chapter, score, correct_answers,
    ///                   wrong_answers, total_questions, time_taken_seconds, created_at
    pub fn from_row(row: &Row) -> rusqlite::Result<QuizAttempt> {
        Ok(QuizAttempt {
            id: row.get(0)?,
            user_id: row.get(1)?,
            subject: row.get(2)?,
            chapter: row.get(3)?,
            score: row.get(4)?,
            correct_answers: row.get(5)?,
            wrong_answers: row.get(6)?,
            total_questions: row.get(7)?,
            time_taken_seconds: row.get(8)?,
            created_at: parse_db_timestamp(&row.get::<_, String>(9)?, 9)?,
        })
    }
}

/// Factory for creating StudySession objects from database rows
pub struct StudySessionRowFactory;

impl StudySessionRowFactory {
    /// Creates a StudySession from a database row
    /// Expected columns: id, user_id, start_time, end_time, duration_seconds, study_type
    pub fn from_row(row: &Row) -> rusqlite::Result<StudySession> {
        Ok(StudySession {
            id: row.get(0)?,
            user_id: row.get(1)?,
            start_time: parse_db_timestamp(&row.get::<_, String>(2)?, 2)?,
            end_time: row
                .get::<_, Option<String>>(3)?
                .map(|s| parse_db_timestamp(&s, 3))
                .transpose()?,
            duration_seconds: row.get(4)?,
            study_type: row.get(5)?,
        })
    }
}
