//! Month-to-date study time: the passive page-presence tracker, its local cache,
//! the manual countdown timer and the achievements earned from sessions.

pub mod achievements;
pub mod cache;
pub mod countdown;
pub mod tracker;

pub use achievements::{Achievement, Tier, award_after_session, evaluate_achievements};
pub use cache::{CachedStudyTime, JsonFileCache, MemoryCache, StudyTimeCache};
pub use countdown::{CountdownConfig, CountdownState, CountdownTimer};
pub use tracker::{LifecycleEvent, StudyTimeTracker, TrackerConfig, TrackerState, start_of_month};
