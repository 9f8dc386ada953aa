use crate::quiz_attempt::{NewQuizAttempt, QuizAttempt};
use crate::row_factories::{QuizAttemptRowFactory, to_db_timestamp};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

const SELECT_COLUMNS: &str = "SELECT id, user_id, subject, chapter, score, correct_answers,
        wrong_answers, total_questions, time_taken_seconds, created_at
     FROM quiz_attempts";

pub struct QuizAttemptsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> QuizAttemptsRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        QuizAttemptsRepository { conn }
    }

    pub fn insert(&self, attempt: &NewQuizAttempt) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO quiz_attempts (user_id, subject, chapter, score, correct_answers,
                wrong_answers, total_questions, time_taken_seconds, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                attempt.user_id,
                attempt.subject,
                attempt.chapter,
                attempt.score.min(100),
                attempt.correct_answers,
                attempt.wrong_answers,
                attempt.total_questions,
                attempt.time_taken_seconds,
                to_db_timestamp(attempt.created_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Full history of a user, most recent first
    pub fn for_user(&self, user_id: &str) -> Result<Vec<QuizAttempt>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([user_id], QuizAttemptRowFactory::from_row)?;
        rows.collect()
    }

    /// Attempts created at or after `since`, most recent first
    pub fn for_user_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<QuizAttempt>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE user_id = ?1 AND created_at >= ?2
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(
            params![user_id, to_db_timestamp(since)],
            QuizAttemptRowFactory::from_row,
        )?;
        rows.collect()
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM quiz_attempts", [], |row| row.get(0))?;
        Ok(count)
    }
}
