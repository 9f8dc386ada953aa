use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use gyaan_progress::database::Database;
use gyaan_progress::date_provider::ManualDateProvider;
use gyaan_progress::store::{InMemoryStore, ProgressStore};
use gyaan_progress::study_session::{NewStudySession, PAGE_PRESENCE};
use gyaan_progress::study_time::{
    CachedStudyTime, JsonFileCache, LifecycleEvent, MemoryCache, StudyTimeCache,
    StudyTimeTracker, TrackerConfig, TrackerState,
};
use std::sync::Arc;
use tempfile::TempDir;

fn config() -> TrackerConfig {
    TrackerConfig {
        utc_offset: FixedOffset::east_opt(0).unwrap(),
        ..TrackerConfig::default()
    }
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
}

fn tracker(
    store: Arc<dyn ProgressStore>,
    cache: Arc<dyn StudyTimeCache>,
    clock: Arc<ManualDateProvider>,
) -> StudyTimeTracker {
    StudyTimeTracker::new("u1", store, cache, clock, config())
}

fn completed_session(start: DateTime<Utc>, minutes: i64) -> NewStudySession {
    NewStudySession {
        user_id: "u1".to_string(),
        start_time: start,
        end_time: start + Duration::minutes(minutes),
        duration_seconds: (minutes * 60) as u32,
        study_type: PAGE_PRESENCE.to_string(),
    }
}

#[test]
fn test_paused_time_is_not_recorded() {
    let db = Arc::new(Database::new(":memory:").unwrap());
    let clock = Arc::new(ManualDateProvider::new(at(17, 10, 0)));
    let mut tracker = tracker(db.clone(), Arc::new(MemoryCache::new()), clock.clone());

    tracker.mount();
    clock.set(at(17, 10, 10));
    tracker.pause();
    clock.set(at(17, 10, 15));
    tracker.resume();
    clock.set(at(17, 10, 20));
    tracker.stop();

    let sessions = db.study_sessions_since("u1", at(1, 0, 0)).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_seconds, 900);
    assert_eq!(sessions[0].end_time, Some(at(17, 10, 20)));
}

#[test]
fn test_session_duration_is_rounded_to_seconds() {
    let db = Arc::new(Database::new(":memory:").unwrap());
    let clock = Arc::new(ManualDateProvider::new(at(17, 10, 0)));
    let mut tracker = tracker(db.clone(), Arc::new(MemoryCache::new()), clock.clone());

    tracker.mount();
    clock.advance(Duration::milliseconds(61_600));
    assert_eq!(tracker.stop(), Some(62));
    assert_eq!(tracker.stop(), None);
    assert_eq!(tracker.base_total(), Duration::seconds(62));
}

#[test]
fn test_reload_resumes_open_session_from_cache() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("progress.db");
    let db = Arc::new(Database::new(db_path.to_str().unwrap()).unwrap());
    let cache = Arc::new(JsonFileCache::new(dir.path().join("cache")));
    let clock = Arc::new(ManualDateProvider::new(at(17, 9, 0)));

    let mut first = tracker(db.clone(), cache.clone(), clock.clone());
    first.mount();
    clock.advance(Duration::minutes(10));
    first.tick();
    // The page goes away without a clean stop
    drop(first);

    clock.advance(Duration::minutes(5));
    let mut second = tracker(db.clone(), cache.clone(), clock.clone());
    second.mount();
    assert_eq!(second.state(), TrackerState::Tracking);
    assert_eq!(second.displayed_total(), Duration::minutes(15));

    clock.advance(Duration::minutes(5));
    assert_eq!(second.stop(), Some(1200));

    let sessions = db.study_sessions_since("u1", at(1, 0, 0)).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].start_time, at(17, 9, 0));
    assert_eq!(sessions[0].duration_seconds, 1200);
    assert_eq!(second.base_total(), Duration::minutes(20));

    let cached = cache.load("u1").unwrap().unwrap();
    assert_eq!(cached.total_millis_this_month, 1_200_000);
    assert_eq!(cached.open_session_start, None);
}

#[test]
fn test_remote_total_wins_when_larger() {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_study_session(&completed_session(at(3, 8, 0), 20))
        .unwrap();
    // Sessions from last month are not part of this month's total
    store
        .insert_study_session(&completed_session(
            Utc.with_ymd_and_hms(2023, 12, 30, 8, 0, 0).unwrap(),
            45,
        ))
        .unwrap();
    let cache = Arc::new(MemoryCache::new());
    cache
        .save(
            "u1",
            &CachedStudyTime {
                total_millis_this_month: 10 * 60 * 1000,
                last_updated: at(10, 12, 0),
                open_session_start: None,
                open_session_id: None,
            },
        )
        .unwrap();
    let clock = Arc::new(ManualDateProvider::new(at(17, 10, 0)));

    let mut tracker = tracker(store, cache, clock);
    tracker.handle(LifecycleEvent::Hidden);
    tracker.mount();
    assert_eq!(tracker.state(), TrackerState::Idle);
    assert_eq!(tracker.base_total(), Duration::minutes(20));
}

#[test]
fn test_cached_total_wins_when_larger() {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_study_session(&completed_session(at(3, 8, 0), 20))
        .unwrap();
    let cache = Arc::new(MemoryCache::new());
    cache
        .save(
            "u1",
            &CachedStudyTime {
                total_millis_this_month: 50 * 60 * 1000,
                last_updated: at(16, 12, 0),
                open_session_start: None,
                open_session_id: None,
            },
        )
        .unwrap();
    let clock = Arc::new(ManualDateProvider::new(at(17, 10, 0)));

    let mut tracker = tracker(store, cache, clock);
    tracker.mount();
    assert_eq!(tracker.base_total(), Duration::minutes(50));
}

#[test]
fn test_cache_from_previous_month_is_ignored() {
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    cache
        .save(
            "u1",
            &CachedStudyTime {
                total_millis_this_month: 300 * 60 * 1000,
                last_updated: Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap(),
                open_session_start: Some(Utc.with_ymd_and_hms(2023, 12, 31, 22, 0, 0).unwrap()),
                open_session_id: None,
            },
        )
        .unwrap();
    let clock = Arc::new(ManualDateProvider::new(at(1, 9, 0)));

    let mut tracker = tracker(store.clone(), cache.clone(), clock);
    tracker.mount();

    assert_eq!(tracker.base_total(), Duration::zero());
    let sessions = store.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].start_time, at(1, 9, 0));
    assert_eq!(cache.load("u1").unwrap().unwrap().last_updated, at(1, 9, 0));
}

#[test]
fn test_read_failure_falls_back_to_cache() {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_study_session(&completed_session(at(3, 8, 0), 90))
        .unwrap();
    store.fail_reads(true);
    let cache = Arc::new(MemoryCache::new());
    cache
        .save(
            "u1",
            &CachedStudyTime {
                total_millis_this_month: 30 * 60 * 1000,
                last_updated: at(16, 12, 0),
                open_session_start: None,
                open_session_id: None,
            },
        )
        .unwrap();
    let clock = Arc::new(ManualDateProvider::new(at(17, 10, 0)));

    let mut tracker = tracker(store, cache, clock.clone());
    tracker.mount();
    assert_eq!(tracker.base_total(), Duration::minutes(30));

    clock.advance(Duration::minutes(5));
    assert_eq!(tracker.tick(), Duration::minutes(35));
}

#[test]
fn test_write_failure_keeps_cache_authoritative() {
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let clock = Arc::new(ManualDateProvider::new(at(17, 10, 0)));

    let mut tracker = tracker(store.clone(), cache.clone(), clock.clone());
    tracker.mount();
    store.fail_writes(true);
    clock.advance(Duration::minutes(7));
    tracker.handle(LifecycleEvent::Unload);

    assert!(store.sessions()[0].is_open());
    assert_eq!(
        cache.load("u1").unwrap().unwrap().total_millis_this_month,
        7 * 60 * 1000
    );

    // Next load trusts the larger cached total over the store
    store.fail_writes(false);
    let mut reloaded = StudyTimeTracker::new("u1", store, cache, clock, config());
    reloaded.mount();
    assert_eq!(reloaded.base_total(), Duration::minutes(7));
}

#[test]
fn test_achievements_after_long_weekend_session() {
    let db = Arc::new(Database::new(":memory:").unwrap());
    // 2024-01-20 was a Saturday
    let clock = Arc::new(ManualDateProvider::new(at(20, 13, 0)));
    let mut tracker = tracker(db.clone(), Arc::new(MemoryCache::new()), clock.clone());

    tracker.mount();
    clock.advance(Duration::hours(2));
    tracker.stop();

    let titles: Vec<&str> = tracker.new_achievements().iter().map(|a| a.title()).collect();
    assert_eq!(
        titles,
        vec![
            "First Study Session",
            "1 Hour Club",
            "Marathon Study",
            "Weekend Warrior"
        ]
    );
    assert_eq!(db.achievements_for("u1").unwrap().len(), 4);

    // Already held achievements are not granted again
    tracker.start();
    clock.advance(Duration::minutes(1));
    tracker.stop();
    assert!(tracker.new_achievements().is_empty());
}

#[test]
fn test_running_tracker_splits_session_at_month_boundary() {
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let clock = Arc::new(ManualDateProvider::new(at(31, 22, 0)));

    let mut january = tracker(store.clone(), cache.clone(), clock.clone());
    january.mount();
    clock.set(at(31, 23, 0));
    january.handle(LifecycleEvent::Hidden);
    january.handle(LifecycleEvent::Visible);
    assert_eq!(january.base_total(), Duration::hours(1));

    clock.set(Utc.with_ymd_and_hms(2024, 2, 1, 1, 0, 0).unwrap());
    assert_eq!(january.tick(), Duration::hours(1));
    assert_eq!(january.base_total(), Duration::zero());

    let cached = cache.load("u1").unwrap().unwrap();
    assert_eq!(cached.total_millis_this_month, 0);
    assert_eq!(
        cached.open_session_start,
        Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
    );

    drop(january);
    let mut february = tracker(store.clone(), cache, clock.clone());
    february.mount();
    assert_eq!(february.base_total(), Duration::zero());
    assert_eq!(february.displayed_total(), Duration::hours(1));

    clock.advance(Duration::minutes(1));
    assert_eq!(february.stop(), Some(3660));

    let mut durations: Vec<(DateTime<Utc>, u32)> = store
        .sessions()
        .iter()
        .map(|s| (s.start_time, s.duration_seconds))
        .collect();
    durations.sort();
    assert_eq!(
        durations,
        vec![
            (at(31, 22, 0), 3600),
            (at(31, 23, 0), 3600),
            (Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(), 3660),
        ]
    );
}

#[test]
fn test_hidden_mount_closes_recovered_session() {
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    cache
        .save(
            "u1",
            &CachedStudyTime {
                total_millis_this_month: 0,
                last_updated: at(17, 9, 50),
                open_session_start: Some(at(17, 9, 30)),
                open_session_id: None,
            },
        )
        .unwrap();
    let clock = Arc::new(ManualDateProvider::new(at(17, 10, 0)));

    let mut tracker = tracker(store.clone(), cache.clone(), clock.clone());
    tracker.handle(LifecycleEvent::Hidden);
    tracker.mount();

    assert_eq!(tracker.state(), TrackerState::Idle);
    assert_eq!(tracker.base_total(), Duration::minutes(20));
    let sessions = store.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].end_time, Some(at(17, 9, 50)));
    assert_eq!(sessions[0].duration_seconds, 1200);
    assert_eq!(cache.load("u1").unwrap().unwrap().open_session_start, None);

    clock.advance(Duration::hours(5));
    assert_eq!(tracker.displayed_total(), Duration::minutes(20));
}
