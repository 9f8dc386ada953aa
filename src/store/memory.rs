use crate::error::StoreError;
use crate::quiz_attempt::{NewQuizAttempt, QuizAttempt};
use crate::store::ProgressStore;
use crate::study_session::{NewStudySession, StudySession};
use crate::study_time::achievements::Achievement;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    attempts: Vec<QuizAttempt>,
    sessions: Vec<StudySession>,
    achievements: Vec<(String, String, DateTime<Utc>)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`ProgressStore`] with switches to simulate an unreachable backend
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read return `StoreError::Unavailable`
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write return `StoreError::Unavailable`
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// All stored sessions, in insertion order
    pub fn sessions(&self) -> Vec<StudySession> {
        self.tables().sessions.clone()
    }

    pub fn achievement_titles(&self, user_id: &str) -> Vec<String> {
        self.tables()
            .achievements
            .iter()
            .filter(|(user, _, _)| user == user_id)
            .map(|(_, title, _)| title.clone())
            .collect()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl ProgressStore for InMemoryStore {
    fn quiz_attempts(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<QuizAttempt>, StoreError> {
        self.check_read()?;
        let mut attempts: Vec<QuizAttempt> = self
            .tables()
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| since.is_none_or(|since| a.created_at >= since))
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(attempts)
    }

    fn insert_quiz_attempt(&self, attempt: &NewQuizAttempt) -> Result<i64, StoreError> {
        self.check_write()?;
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.attempts.push(attempt.clone().into_attempt(id));
        Ok(id)
    }

    fn open_study_session(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        study_type: &str,
    ) -> Result<i64, StoreError> {
        self.check_write()?;
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.sessions.push(StudySession {
            id,
            user_id: user_id.to_string(),
            start_time,
            end_time: None,
            duration_seconds: 0,
            study_type: study_type.to_string(),
        });
        Ok(id)
    }

    fn close_study_session(
        &self,
        session_id: i64,
        end_time: DateTime<Utc>,
        duration_seconds: u32,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut tables = self.tables();
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        session.end_time = Some(end_time);
        session.duration_seconds = duration_seconds;
        Ok(())
    }

    fn insert_study_session(&self, session: &NewStudySession) -> Result<i64, StoreError> {
        self.check_write()?;
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.sessions.push(StudySession {
            id,
            user_id: session.user_id.clone(),
            start_time: session.start_time,
            end_time: Some(session.end_time),
            duration_seconds: session.duration_seconds,
            study_type: session.study_type.clone(),
        });
        Ok(id)
    }

    fn study_sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StudySession>, StoreError> {
        self.check_read()?;
        let mut sessions: Vec<StudySession> = self
            .tables()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.start_time >= since)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    fn has_achievement(&self, user_id: &str, title: &str) -> Result<bool, StoreError> {
        self.check_read()?;
        Ok(self
            .tables()
            .achievements
            .iter()
            .any(|(user, t, _)| user == user_id && t == title))
    }

    fn grant_achievement(
        &self,
        user_id: &str,
        achievement: &Achievement,
        granted_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.check_write()?;
        let mut tables = self.tables();
        let title = achievement.title();
        if tables
            .achievements
            .iter()
            .any(|(user, t, _)| user == user_id && t == title)
        {
            return Ok(false);
        }
        tables
            .achievements
            .push((user_id.to_string(), title.to_string(), granted_at));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study_session::PAGE_PRESENCE;
    use chrono::Duration;

    #[test]
    fn test_open_and_close_session() {
        let store = InMemoryStore::new();
        let start = Utc::now();
        let id = store.open_study_session("u1", start, PAGE_PRESENCE).unwrap();
        store
            .close_study_session(id, start + Duration::seconds(30), 30)
            .unwrap();

        let sessions = store.study_sessions_since("u1", start).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_seconds, 30);
        assert!(!sessions[0].is_open());
    }

    #[test]
    fn test_close_unknown_session() {
        let store = InMemoryStore::new();
        let result = store.close_study_session(42, Utc::now(), 1);
        assert!(matches!(result, Err(StoreError::SessionNotFound(42))));
    }

    #[test]
    fn test_failure_switches() {
        let store = InMemoryStore::new();
        store.fail_reads(true);
        assert!(store.quiz_attempts("u1", None).is_err());
        store.fail_reads(false);
        assert!(store.quiz_attempts("u1", None).is_ok());

        store.fail_writes(true);
        assert!(
            store
                .open_study_session("u1", Utc::now(), PAGE_PRESENCE)
                .is_err()
        );
    }

    #[test]
    fn test_grant_achievement_once() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        assert!(
            store
                .grant_achievement("u1", &Achievement::FirstStudySession, now)
                .unwrap()
        );
        assert!(
            !store
                .grant_achievement("u1", &Achievement::FirstStudySession, now)
                .unwrap()
        );
        assert!(
            store
                .has_achievement("u1", Achievement::FirstStudySession.title())
                .unwrap()
        );
        assert!(
            !store
                .has_achievement("u2", Achievement::FirstStudySession.title())
                .unwrap()
        );
    }
}
