use crate::error::CacheError;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Per-user running total kept locally so a reload does not lose displayed progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedStudyTime {
    /// Completed study time this month, excluding any open session
    pub total_millis_this_month: i64,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_session_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_session_id: Option<i64>,
}

impl CachedStudyTime {
    /// Whether `last_updated` falls in the same calendar month as `now`, in `now`'s zone
    pub fn is_current_month<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let updated = self.last_updated.with_timezone(&now.timezone());
        updated.year() == now.year() && updated.month() == now.month()
    }
}

pub trait StudyTimeCache: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Option<CachedStudyTime>, CacheError>;
    fn save(&self, user_id: &str, entry: &CachedStudyTime) -> Result<(), CacheError>;
    fn clear(&self, user_id: &str) -> Result<(), CacheError>;
}

/// One `study_time_<user>.json` file per user inside a directory
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("study_time_{}.json", safe))
    }
}

impl StudyTimeCache for JsonFileCache {
    fn load(&self, user_id: &str) -> Result<Option<CachedStudyTime>, CacheError> {
        let contents = match fs::read_to_string(self.path_for(user_id)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, user_id: &str, entry: &CachedStudyTime) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(entry)?;
        fs::write(self.path_for(user_id), json)?;
        Ok(())
    }

    fn clear(&self, user_id: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(user_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedStudyTime>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedStudyTime>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StudyTimeCache for MemoryCache {
    fn load(&self, user_id: &str) -> Result<Option<CachedStudyTime>, CacheError> {
        Ok(self.entries().get(user_id).cloned())
    }

    fn save(&self, user_id: &str, entry: &CachedStudyTime) -> Result<(), CacheError> {
        self.entries().insert(user_id.to_string(), entry.clone());
        Ok(())
    }

    fn clear(&self, user_id: &str) -> Result<(), CacheError> {
        self.entries().remove(user_id);
        Ok(())
    }
}
