use thiserror::Error;

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration error: {0}")]
    Migration(#[from] refinery::Error),
    #[error("study session {0} not found")]
    SessionNotFound(i64),
    /// The store could not be reached (remote outage, injected failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the browser-local style study time cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ProgressError {
    /// Loading quiz attempts failed; the caller may retry.
    #[error("failed to fetch quiz attempts for user '{user_id}'")]
    Fetch {
        user_id: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to read study sessions")]
    PersistenceRead(#[source] StoreError),
    #[error("failed to write study session")]
    PersistenceWrite(#[source] StoreError),
}

impl ProgressError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProgressError::Fetch { .. })
    }
}
