pub mod achievements;
pub mod connection;
pub mod quiz_attempts;
pub mod study_sessions;

use crate::date_provider::{DateProvider, SystemDateProvider};
use crate::error::StoreError;
use crate::quiz_attempt::{NewQuizAttempt, QuizAttempt};
use crate::store::ProgressStore;
use crate::study_session::{NewStudySession, StudySession};
use crate::study_time::achievements::Achievement;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

pub use achievements::AchievementsRepository;
pub use quiz_attempts::QuizAttemptsRepository;
pub use study_sessions::StudySessionsRepository;

/// SQLite-backed [`ProgressStore`] providing access to all repositories
pub struct Database {
    conn: Mutex<Connection>,
    date_provider: Arc<dyn DateProvider>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        Self::init(db_path, Arc::new(SystemDateProvider))
    }

    pub fn with_date_provider(
        db_path: &str,
        date_provider: Arc<dyn DateProvider>,
    ) -> Result<Self, StoreError> {
        Self::init(db_path, date_provider)
    }

    fn init(db_path: &str, date_provider: Arc<dyn DateProvider>) -> Result<Self, StoreError> {
        let conn = connection::init_connection(db_path)?;
        Ok(Database {
            conn: Mutex::new(conn),
            date_provider,
        })
    }

    /// The clock this database was opened with, shared with services built on top of it
    pub fn date_provider(&self) -> Arc<dyn DateProvider> {
        Arc::clone(&self.date_provider)
    }

    /// Exclusive access to the underlying connection
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ===== Quiz Attempts Repository Access =====

    /// Record an attempt stamped with the database clock
    pub fn record_quiz_attempt_now(
        &self,
        mut attempt: NewQuizAttempt,
    ) -> Result<i64, StoreError> {
        attempt.created_at = self.date_provider.get_current_time();
        self.insert_quiz_attempt(&attempt)
    }

    pub fn count_quiz_attempts(&self) -> Result<i64, StoreError> {
        let conn = self.conn();
        Ok(QuizAttemptsRepository::new(&conn).count()?)
    }

    // ===== Study Sessions Repository Access =====

    pub fn get_study_session(&self, session_id: i64) -> Result<Option<StudySession>, StoreError> {
        let conn = self.conn();
        Ok(StudySessionsRepository::new(&conn).get(session_id)?)
    }

    // ===== Achievements Repository Access =====

    pub fn achievements_for(&self, user_id: &str) -> Result<Vec<Achievement>, StoreError> {
        let conn = self.conn();
        Ok(AchievementsRepository::new(&conn).for_user(user_id)?)
    }
}

impl ProgressStore for Database {
    fn quiz_attempts(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<QuizAttempt>, StoreError> {
        let conn = self.conn();
        let repo = QuizAttemptsRepository::new(&conn);
        let attempts = match since {
            Some(since) => repo.for_user_since(user_id, since)?,
            None => repo.for_user(user_id)?,
        };
        Ok(attempts)
    }

    fn insert_quiz_attempt(&self, attempt: &NewQuizAttempt) -> Result<i64, StoreError> {
        let conn = self.conn();
        Ok(QuizAttemptsRepository::new(&conn).insert(attempt)?)
    }

    fn open_study_session(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        study_type: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();
        Ok(StudySessionsRepository::new(&conn).open(user_id, start_time, study_type)?)
    }

    fn close_study_session(
        &self,
        session_id: i64,
        end_time: DateTime<Utc>,
        duration_seconds: u32,
    ) -> Result<(), StoreError> {
        let conn = self.conn();
        let updated =
            StudySessionsRepository::new(&conn).close(session_id, end_time, duration_seconds)?;
        if updated == 0 {
            return Err(StoreError::SessionNotFound(session_id));
        }
        Ok(())
    }

    fn insert_study_session(&self, session: &NewStudySession) -> Result<i64, StoreError> {
        let conn = self.conn();
        Ok(StudySessionsRepository::new(&conn).insert_complete(session)?)
    }

    fn study_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StudySession>, StoreError> {
        let conn = self.conn();
        Ok(StudySessionsRepository::new(&conn).since(user_id, since)?)
    }

    fn has_achievement(&self, user_id: &str, title: &str) -> Result<bool, StoreError> {
        let conn = self.conn();
        Ok(AchievementsRepository::new(&conn).exists(user_id, title)?)
    }

    fn grant_achievement(
        &self,
        user_id: &str,
        achievement: &Achievement,
        granted_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn();
        Ok(AchievementsRepository::new(&conn).grant(user_id, achievement, granted_at)?)
    }
}
