use chrono::{DateTime, Utc};
use serde::Serialize;

/// Study type recorded by the passive page-presence tracker
pub const PAGE_PRESENCE: &str = "page_presence";
/// Study type recorded by the manual countdown timer
pub const POMODORO_TIMER: &str = "pomodoro_timer";

/// One contiguous interval of tracked study time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudySession {
    pub id: i64,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    /// `None` while the session is still open
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    pub study_type: String,
}

impl StudySession {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A complete session written in a single insert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStudySession {
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u32,
    pub study_type: String,
}

/// Whole seconds in `millis`, rounded to nearest. Negative spans count as zero.
pub fn millis_to_rounded_seconds(millis: i64) -> u32 {
    if millis <= 0 {
        return 0;
    }
    let seconds = (millis + 500) / 1000;
    u32::try_from(seconds).unwrap_or(u32::MAX)
}
