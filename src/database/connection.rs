use crate::error::StoreError;
use log::debug;
use rusqlite::Connection;

// Embed migrations from the migrations directory
refinery::embed_migrations!("migrations");

/// Initializes the database connection and runs migrations
pub fn init_connection(db_path: &str) -> Result<Connection, StoreError> {
    let mut conn = Connection::open(db_path)?;

    let report = migrations::runner().run(&mut conn)?;
    debug!(
        "Migrations completed successfully ({} applied)",
        report.applied_migrations().len()
    );

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_tables() {
        let conn = init_connection(":memory:").unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();

        assert!(tables.contains(&"quiz_attempts".to_string()));
        assert!(tables.contains(&"study_sessions".to_string()));
        assert!(tables.contains(&"achievements".to_string()));
    }
}
