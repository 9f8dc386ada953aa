use crate::date_provider::DateProvider;
use crate::error::{ProgressError, StoreError};
use crate::store::ProgressStore;
use crate::study_session::{NewStudySession, PAGE_PRESENCE, millis_to_rounded_seconds};
use crate::study_time::achievements::{Achievement, award_after_session};
use crate::study_time::cache::{CachedStudyTime, StudyTimeCache};
use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub study_type: String,
    /// Offset used to decide where the calendar month starts
    pub utc_offset: FixedOffset,
    /// How often the host is expected to call [`StudyTimeTracker::tick`]
    pub tick_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            study_type: PAGE_PRESENCE.to_string(),
            utc_offset: *Local::now().offset(),
            tick_interval: Duration::seconds(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Tracking,
    Paused,
}

/// Host page lifecycle signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Hidden,
    Visible,
    Unload,
}

#[derive(Debug, Clone)]
struct OpenSession {
    start: DateTime<Utc>,
    /// Start of the running segment, `None` while paused
    segment_start: Option<DateTime<Utc>>,
    /// Active time of the segments already ended by a pause
    banked_millis: i64,
    remote_id: Option<i64>,
}

impl OpenSession {
    fn active_millis(&self, now: DateTime<Utc>) -> i64 {
        let running = self
            .segment_start
            .map(|segment| (now - segment).num_milliseconds().max(0))
            .unwrap_or(0);
        self.banked_millis + running
    }
}

/// Measures time-on-page for one user over the current calendar month.
///
/// The host maps its visibility and unload signals onto [`LifecycleEvent`]s (or calls
/// `start`/`stop`/`pause`/`resume` directly) and calls `tick` periodically. Completed
/// sessions are written to the store best-effort; the local cache carries the running
/// total and any open session across reloads.
pub struct StudyTimeTracker {
    user_id: String,
    store: Arc<dyn ProgressStore>,
    cache: Arc<dyn StudyTimeCache>,
    clock: Arc<dyn DateProvider>,
    config: TrackerConfig,
    state: TrackerState,
    mounted: bool,
    visible: bool,
    base_millis: i64,
    /// Start of the calendar month `base_millis` belongs to
    month_start: DateTime<Utc>,
    session: Option<OpenSession>,
    new_achievements: Vec<Achievement>,
    last_error: Option<ProgressError>,
}

impl StudyTimeTracker {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn ProgressStore>,
        cache: Arc<dyn StudyTimeCache>,
        clock: Arc<dyn DateProvider>,
        config: TrackerConfig,
    ) -> Self {
        StudyTimeTracker {
            user_id: user_id.into(),
            store,
            cache,
            clock,
            config,
            state: TrackerState::Idle,
            mounted: false,
            visible: true,
            base_millis: 0,
            month_start: DateTime::<Utc>::UNIX_EPOCH,
            session: None,
            new_achievements: Vec::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Completed study time this month, excluding the open session
    pub fn base_total(&self) -> Duration {
        Duration::milliseconds(self.base_millis)
    }

    /// Month-to-date total including the active time of the open session
    pub fn displayed_total(&self) -> Duration {
        let now = self.clock.get_current_time();
        let open = self
            .session
            .as_ref()
            .map(|s| s.active_millis(now))
            .unwrap_or(0);
        Duration::milliseconds(self.base_millis + open)
    }

    /// Achievements granted by the most recent `stop`
    pub fn new_achievements(&self) -> &[Achievement] {
        &self.new_achievements
    }

    /// Most recent store failure, cleared once a session is written successfully
    pub fn last_error(&self) -> Option<&ProgressError> {
        self.last_error.as_ref()
    }

    /// Seed the month total from the store and the local cache, then begin tracking.
    ///
    /// A cached open session (left behind by an unclean shutdown) is resumed from its
    /// original start time. While the page is hidden it is closed at the last time the
    /// cache was refreshed instead.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        let now = self.local_now();
        let month_start = start_of_month(&now);
        self.month_start = month_start;
        let remote_millis = self.remote_month_millis(month_start);

        let cached = self.load_current_cache(&now);
        let cached_millis = cached
            .as_ref()
            .map(|c| c.total_millis_this_month)
            .unwrap_or(0);
        self.base_millis = remote_millis.max(cached_millis);
        self.mounted = true;
        debug!(
            "Mounted tracker for {}: remote {} ms, cached {} ms",
            self.user_id, remote_millis, cached_millis
        );

        let recovered = cached.and_then(|c| {
            c.open_session_start
                .map(|start| (start, c.open_session_id, c.last_updated))
        });
        match recovered {
            Some((start, remote_id, last_seen)) => {
                info!(
                    "Recovering study session for {} started at {}",
                    self.user_id, start
                );
                self.session = Some(OpenSession {
                    start,
                    segment_start: Some(start),
                    banked_millis: 0,
                    remote_id,
                });
                self.state = TrackerState::Tracking;
                if self.visible {
                    self.save_cache();
                } else {
                    let end = last_seen.max(start).min(self.clock.get_current_time());
                    self.finish_session(end);
                }
            }
            None => {
                self.start();
            }
        }
    }

    /// Open a session. Ignored unless mounted, visible and idle.
    pub fn start(&mut self) -> bool {
        if !self.mounted || !self.visible || self.state != TrackerState::Idle {
            return false;
        }
        self.roll_over_month();
        let now = self.clock.get_current_time();
        let remote_id = self.open_remote(now);
        self.session = Some(OpenSession {
            start: now,
            segment_start: Some(now),
            banked_millis: 0,
            remote_id,
        });
        self.state = TrackerState::Tracking;
        debug!("Started tracking {} at {}", self.user_id, now);
        self.save_cache();
        true
    }

    /// Stop accumulating without closing the session
    pub fn pause(&mut self) -> bool {
        if self.state != TrackerState::Tracking {
            return false;
        }
        self.roll_over_month();
        let now = self.clock.get_current_time();
        if let Some(session) = self.session.as_mut() {
            session.banked_millis = session.active_millis(now);
            session.segment_start = None;
        }
        self.state = TrackerState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != TrackerState::Paused || !self.visible {
            return false;
        }
        self.roll_over_month();
        let now = self.clock.get_current_time();
        if let Some(session) = self.session.as_mut() {
            session.segment_start = Some(now);
        }
        self.state = TrackerState::Tracking;
        true
    }

    /// Close the open session, add its active time to the month total and flush it to
    /// the store. Returns the recorded duration in seconds; a second call is a no-op.
    pub fn stop(&mut self) -> Option<u32> {
        if self.session.is_none() {
            return None;
        }
        self.roll_over_month();
        let now = self.clock.get_current_time();
        self.finish_session(now)
    }

    /// Refresh the local cache and return the total to display
    pub fn tick(&mut self) -> Duration {
        if self.session.is_some() {
            self.roll_over_month();
            self.save_cache();
        }
        self.displayed_total()
    }

    pub fn handle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Hidden => {
                self.visible = false;
                self.stop();
            }
            LifecycleEvent::Visible => {
                self.visible = true;
                self.start();
            }
            LifecycleEvent::Unload => {
                self.stop();
            }
        }
    }

    pub fn unmount(&mut self) {
        self.stop();
        self.mounted = false;
    }

    /// Close the open session at `end` and add its active time to the month total
    fn finish_session(&mut self, end: DateTime<Utc>) -> Option<u32> {
        let session = self.session.take()?;
        let duration_seconds = millis_to_rounded_seconds(session.active_millis(end));
        self.base_millis += i64::from(duration_seconds) * 1000;
        self.state = TrackerState::Idle;
        self.new_achievements.clear();
        self.write_session(&session, end, duration_seconds);
        self.save_cache();
        Some(duration_seconds)
    }

    fn write_session(&mut self, session: &OpenSession, end: DateTime<Utc>, duration_seconds: u32) {
        let written = match session.remote_id {
            Some(id) => self.store.close_study_session(id, end, duration_seconds),
            None => self
                .store
                .insert_study_session(&NewStudySession {
                    user_id: self.user_id.clone(),
                    start_time: session.start,
                    end_time: end,
                    duration_seconds,
                    study_type: self.config.study_type.clone(),
                })
                .map(|_| ()),
        };
        match written {
            Ok(()) => {
                debug!(
                    "Recorded {}s study session for {}",
                    duration_seconds, self.user_id
                );
                self.last_error = None;
                self.award_achievements(end, duration_seconds);
            }
            Err(e) => {
                warn!(
                    "Could not record {}s study session for {}: {}",
                    duration_seconds, self.user_id, e
                );
                self.record_write_failure(e);
            }
        }
    }

    fn open_remote(&mut self, start: DateTime<Utc>) -> Option<i64> {
        match self
            .store
            .open_study_session(&self.user_id, start, &self.config.study_type)
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Could not open study session for {}: {}", self.user_id, e);
                self.record_write_failure(e);
                None
            }
        }
    }

    fn remote_month_millis(&mut self, month_start: DateTime<Utc>) -> i64 {
        match self.store.study_sessions_since(&self.user_id, month_start) {
            Ok(sessions) => sessions
                .iter()
                .map(|s| i64::from(s.duration_seconds) * 1000)
                .sum(),
            Err(e) => {
                warn!(
                    "Could not read study sessions for {}, starting from the local cache: {}",
                    self.user_id, e
                );
                self.last_error = Some(ProgressError::PersistenceRead(e));
                0
            }
        }
    }

    /// Once the clock passes into a new calendar month, split the open session at the
    /// boundary and re-seed the month total from the store.
    fn roll_over_month(&mut self) {
        if !self.mounted {
            return;
        }
        let month_start = start_of_month(&self.local_now());
        if month_start <= self.month_start {
            return;
        }
        info!(
            "Study month rolled over for {} at {}",
            self.user_id, month_start
        );
        self.month_start = month_start;

        let carried = self.session.take().map(|session| {
            let before = millis_to_rounded_seconds(session.active_millis(month_start));
            self.write_session(&session, month_start, before);
            session.segment_start.is_some()
        });
        self.base_millis = self.remote_month_millis(month_start);

        if let Some(running) = carried {
            let remote_id = self.open_remote(month_start);
            self.session = Some(OpenSession {
                start: month_start,
                segment_start: running.then_some(month_start),
                banked_millis: 0,
                remote_id,
            });
        }
        self.save_cache();
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.clock
            .get_current_time()
            .with_timezone(&self.config.utc_offset)
    }

    fn load_current_cache(&self, now: &DateTime<FixedOffset>) -> Option<CachedStudyTime> {
        match self.cache.load(&self.user_id) {
            Ok(Some(cached)) if cached.is_current_month(now) => Some(cached),
            Ok(Some(_)) => {
                info!("Discarding study time cache for {} from an earlier month", self.user_id);
                if let Err(e) = self.cache.clear(&self.user_id) {
                    warn!("Could not clear study time cache: {}", e);
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable study time cache for {}: {}", self.user_id, e);
                None
            }
        }
    }

    fn save_cache(&self) {
        let entry = CachedStudyTime {
            total_millis_this_month: self.base_millis,
            last_updated: self.clock.get_current_time(),
            open_session_start: self.session.as_ref().map(|s| s.start),
            open_session_id: self.session.as_ref().and_then(|s| s.remote_id),
        };
        if let Err(e) = self.cache.save(&self.user_id, &entry) {
            warn!("Could not update study time cache for {}: {}", self.user_id, e);
        }
    }

    fn record_write_failure(&mut self, error: StoreError) {
        self.last_error = Some(ProgressError::PersistenceWrite(error));
    }

    fn award_achievements(&mut self, session_end: DateTime<Utc>, duration_seconds: u32) {
        match award_after_session(
            self.store.as_ref(),
            &self.user_id,
            session_end,
            duration_seconds,
            &self.config.utc_offset,
        ) {
            Ok(granted) => self.new_achievements = granted,
            Err(e) => warn!("Could not evaluate achievements for {}: {}", self.user_id, e),
        }
    }
}

/// First instant of `now`'s calendar month, in `now`'s offset
pub fn start_of_month(now: &DateTime<FixedOffset>) -> DateTime<Utc> {
    let today = now.date_naive();
    let first_day = today.with_day(1).unwrap_or(today);
    let local_midnight = first_day.and_time(NaiveTime::MIN);
    let offset = Duration::seconds(i64::from(now.offset().local_minus_utc()));
    (local_midnight - offset).and_utc()
}
