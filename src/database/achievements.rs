use crate::row_factories::to_db_timestamp;
use crate::study_time::achievements::Achievement;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

pub struct AchievementsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> AchievementsRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        AchievementsRepository { conn }
    }

    pub fn exists(&self, user_id: &str, title: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM achievements WHERE user_id = ?1 AND title = ?2",
            params![user_id, title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Returns `false` when the user already holds the achievement
    pub fn grant(
        &self,
        user_id: &str,
        achievement: &Achievement,
        granted_at: DateTime<Utc>,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO achievements (user_id, title, description, icon, tier, granted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                achievement.title(),
                achievement.description(),
                achievement.icon(),
                achievement.tier().as_str(),
                to_db_timestamp(granted_at),
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Achievements held by a user, in the order they were granted
    pub fn for_user(&self, user_id: &str) -> Result<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT title FROM achievements WHERE user_id = ?1 ORDER BY granted_at, id",
        )?;
        let titles = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>>>()?;
        Ok(titles
            .iter()
            .filter_map(|title| Achievement::from_title(title))
            .collect())
    }
}
