use crate::row_factories::{StudySessionRowFactory, to_db_timestamp};
use crate::study_session::{NewStudySession, StudySession};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

pub struct StudySessionsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> StudySessionsRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        StudySessionsRepository { conn }
    }

    pub fn open(&self, user_id: &str, start_time: DateTime<Utc>, study_type: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO study_sessions (user_id, start_time, study_type) VALUES (?1, ?2, ?3)",
            params![user_id, to_db_timestamp(start_time), study_type],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Close an open session. Returns the number of rows updated (0 for an unknown id).
    pub fn close(
        &self,
        session_id: i64,
        end_time: DateTime<Utc>,
        duration_seconds: u32,
    ) -> Result<usize> {
        self.conn.execute(
            "UPDATE study_sessions SET end_time = ?1, duration_seconds = ?2 WHERE id = ?3",
            params![to_db_timestamp(end_time), duration_seconds, session_id],
        )
    }

    pub fn insert_complete(&self, session: &NewStudySession) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO study_sessions (user_id, start_time, end_time, duration_seconds, study_type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.user_id,
                to_db_timestamp(session.start_time),
                to_db_timestamp(session.end_time),
                session.duration_seconds,
                session.study_type,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, session_id: i64) -> Result<Option<StudySession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, start_time, end_time, duration_seconds, study_type
             FROM study_sessions WHERE id = ?1",
        )?;

        let mut rows = stmt.query([session_id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(StudySessionRowFactory::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Sessions started at or after `since`, most recent first
    pub fn since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, start_time, end_time, duration_seconds, study_type
             FROM study_sessions
             WHERE user_id = ?1 AND start_time >= ?2
             ORDER BY start_time DESC, id DESC",
        )?;
        let rows = stmt.query_map(
            params![user_id, to_db_timestamp(since)],
            StudySessionRowFactory::from_row,
        )?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::init_connection;
    use crate::study_session::{PAGE_PRESENCE, POMODORO_TIMER};
    use chrono::{Duration, TimeZone};

    fn create_test_db() -> Connection {
        init_connection(":memory:").expect("Failed to create test database")
    }

    #[test]
    fn test_open_session_has_no_end() {
        let conn = create_test_db();
        let repo = StudySessionsRepository::new(&conn);
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();

        let id = repo.open("u1", start, PAGE_PRESENCE).unwrap();
        let session = repo.get(id).unwrap().unwrap();
        assert!(session.is_open());
        assert_eq!(session.start_time, start);
        assert_eq!(session.duration_seconds, 0);
        assert_eq!(session.study_type, PAGE_PRESENCE);
    }

    #[test]
    fn test_close_session() {
        let conn = create_test_db();
        let repo = StudySessionsRepository::new(&conn);
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let end = start + Duration::minutes(20);

        let id = repo.open("u1", start, PAGE_PRESENCE).unwrap();
        assert_eq!(repo.close(id, end, 1200).unwrap(), 1);

        let session = repo.get(id).unwrap().unwrap();
        assert_eq!(session.end_time, Some(end));
        assert_eq!(session.duration_seconds, 1200);
    }

    #[test]
    fn test_close_unknown_session_updates_nothing() {
        let conn = create_test_db();
        let repo = StudySessionsRepository::new(&conn);
        assert_eq!(repo.close(99, Utc::now(), 10).unwrap(), 0);
        assert!(repo.get(99).unwrap().is_none());
    }

    #[test]
    fn test_since_filters_by_user_and_start() {
        let conn = create_test_db();
        let repo = StudySessionsRepository::new(&conn);
        let month_start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let session = |user: &str, start: DateTime<Utc>| NewStudySession {
            user_id: user.to_string(),
            start_time: start,
            end_time: start + Duration::minutes(25),
            duration_seconds: 1500,
            study_type: POMODORO_TIMER.to_string(),
        };
        repo.insert_complete(&session("u1", month_start - Duration::hours(1)))
            .unwrap();
        repo.insert_complete(&session("u1", month_start + Duration::days(1)))
            .unwrap();
        repo.insert_complete(&session("u1", month_start + Duration::days(2)))
            .unwrap();
        repo.insert_complete(&session("u2", month_start + Duration::days(1)))
            .unwrap();

        let sessions = repo.since("u1", month_start).unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].start_time > sessions[1].start_time);
    }
}
