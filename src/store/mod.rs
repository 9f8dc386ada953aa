pub mod memory;

use crate::error::StoreError;
use crate::quiz_attempt::{NewQuizAttempt, QuizAttempt};
use crate::study_session::{NewStudySession, StudySession};
use crate::study_time::achievements::Achievement;
use chrono::{DateTime, Utc};

pub use memory::InMemoryStore;

/// Persistence collaborator shared by the metrics service and the study time trackers.
///
/// Implementations must be shareable across threads; the SQLite [`crate::database::Database`]
/// serialises access internally and [`InMemoryStore`] is used as a fake in tests.
pub trait ProgressStore: Send + Sync {
    /// Attempts of `user_id`, most recent first. `since` restricts to attempts created
    /// at or after that instant.
    fn quiz_attempts(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<QuizAttempt>, StoreError>;

    fn insert_quiz_attempt(&self, attempt: &NewQuizAttempt) -> Result<i64, StoreError>;

    /// Create an open session row and return its id
    fn open_study_session(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        study_type: &str,
    ) -> Result<i64, StoreError>;

    fn close_study_session(
        &self,
        session_id: i64,
        end_time: DateTime<Utc>,
        duration_seconds: u32,
    ) -> Result<(), StoreError>;

    /// Write a complete session in one go
    fn insert_study_session(&self, session: &NewStudySession) -> Result<i64, StoreError>;

    /// Sessions of `user_id` started at or after `since`, most recent first
    fn study_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StudySession>, StoreError>;

    fn has_achievement(&self, user_id: &str, title: &str) -> Result<bool, StoreError>;

    /// Record an achievement. Returns `false` if the user already had it.
    fn grant_achievement(
        &self,
        user_id: &str,
        achievement: &Achievement,
        granted_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
