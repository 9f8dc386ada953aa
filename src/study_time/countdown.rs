use crate::date_provider::DateProvider;
use crate::store::ProgressStore;
use crate::study_session::{NewStudySession, POMODORO_TIMER};
use crate::time_format::format_clock;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CountdownConfig {
    pub duration: Duration,
    pub study_type: String,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        CountdownConfig {
            duration: Duration::minutes(25),
            study_type: POMODORO_TIMER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// User-driven countdown that records a study session when it runs out.
///
/// The host calls [`CountdownTimer::tick`] once per second; each tick while running
/// takes one second off the remaining time.
pub struct CountdownTimer {
    user_id: String,
    store: Arc<dyn ProgressStore>,
    clock: Arc<dyn DateProvider>,
    config: CountdownConfig,
    remaining: Duration,
    state: CountdownState,
    started_at: Option<DateTime<Utc>>,
}

impl CountdownTimer {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn ProgressStore>,
        clock: Arc<dyn DateProvider>,
        config: CountdownConfig,
    ) -> Self {
        let remaining = config.duration;
        CountdownTimer {
            user_id: user_id.into(),
            store,
            clock,
            config,
            remaining,
            state: CountdownState::Idle,
            started_at: None,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn duration(&self) -> Duration {
        self.config.duration
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining time as "HH:MM:SS"
    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }

    /// Change the countdown length. Only allowed while idle.
    pub fn set_duration(&mut self, hours: u32, minutes: u32) -> bool {
        if self.state != CountdownState::Idle {
            return false;
        }
        let duration = Duration::hours(i64::from(hours)) + Duration::minutes(i64::from(minutes));
        self.config.duration = duration;
        self.remaining = duration;
        true
    }

    pub fn start(&mut self) -> bool {
        if self.state != CountdownState::Idle || self.remaining <= Duration::zero() {
            return false;
        }
        self.started_at = Some(self.clock.get_current_time());
        self.state = CountdownState::Running;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != CountdownState::Running {
            return false;
        }
        self.state = CountdownState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != CountdownState::Paused {
            return false;
        }
        self.state = CountdownState::Running;
        true
    }

    /// Back to idle with the full configured duration; nothing is recorded
    pub fn reset(&mut self) {
        self.state = CountdownState::Idle;
        self.remaining = self.config.duration;
        self.started_at = None;
    }

    /// Advance one second. Returns `true` on the tick that completes the countdown.
    pub fn tick(&mut self) -> bool {
        if self.state != CountdownState::Running {
            return false;
        }
        self.remaining = (self.remaining - Duration::seconds(1)).max(Duration::zero());
        if self.remaining > Duration::zero() {
            return false;
        }
        self.state = CountdownState::Finished;
        self.record_completion();
        true
    }

    fn record_completion(&self) {
        let end_time = self.clock.get_current_time();
        let duration_seconds =
            u32::try_from(self.config.duration.num_seconds().max(0)).unwrap_or(u32::MAX);
        let session = NewStudySession {
            user_id: self.user_id.clone(),
            start_time: self
                .started_at
                .unwrap_or(end_time - self.config.duration),
            end_time,
            duration_seconds,
            study_type: self.config.study_type.clone(),
        };
        match self.store.insert_study_session(&session) {
            Ok(id) => info!(
                "Recorded {}s {} session {} for {}",
                duration_seconds, session.study_type, id, self.user_id
            ),
            Err(e) => warn!("Could not record countdown session for {}: {}", self.user_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_provider::ManualDateProvider;
    use crate::store::InMemoryStore;
    use chrono::TimeZone;

    fn timer(store: &Arc<InMemoryStore>, clock: &Arc<ManualDateProvider>) -> CountdownTimer {
        CountdownTimer::new("u1", store.clone(), clock.clone(), CountdownConfig::default())
    }

    fn run_ticks(timer: &mut CountdownTimer, clock: &ManualDateProvider, ticks: u32) -> bool {
        let mut completed = false;
        for _ in 0..ticks {
            clock.advance(Duration::seconds(1));
            completed |= timer.tick();
        }
        completed
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_default_display() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualDateProvider::new(start_time()));
        let timer = timer(&store, &clock);
        assert_eq!(timer.display(), "00:25:00");
        assert_eq!(timer.state(), CountdownState::Idle);
    }

    #[test]
    fn test_set_duration_only_while_idle() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualDateProvider::new(start_time()));
        let mut timer = timer(&store, &clock);

        assert!(timer.set_duration(1, 30));
        assert_eq!(timer.display(), "01:30:00");
        timer.start();
        assert!(!timer.set_duration(0, 5));
        assert_eq!(timer.duration(), Duration::minutes(90));
    }

    #[test]
    fn test_completion_records_pomodoro_session() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualDateProvider::new(start_time()));
        let mut timer = timer(&store, &clock);
        timer.set_duration(0, 1);
        timer.start();

        assert!(!run_ticks(&mut timer, &clock, 59));
        assert_eq!(timer.display(), "00:00:01");
        assert!(run_ticks(&mut timer, &clock, 1));
        assert_eq!(timer.state(), CountdownState::Finished);

        let sessions = store.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].study_type, POMODORO_TIMER);
        assert_eq!(sessions[0].duration_seconds, 60);
        assert_eq!(sessions[0].start_time, start_time());
    }

    #[test]
    fn test_pause_stops_the_countdown() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualDateProvider::new(start_time()));
        let mut timer = timer(&store, &clock);
        timer.start();
        run_ticks(&mut timer, &clock, 10);
        assert!(timer.pause());
        run_ticks(&mut timer, &clock, 100);
        assert_eq!(timer.display(), "00:24:50");

        assert!(timer.resume());
        run_ticks(&mut timer, &clock, 50);
        assert_eq!(timer.display(), "00:24:00");
    }

    #[test]
    fn test_reset_records_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualDateProvider::new(start_time()));
        let mut timer = timer(&store, &clock);
        timer.start();
        run_ticks(&mut timer, &clock, 10);
        timer.reset();

        assert_eq!(timer.state(), CountdownState::Idle);
        assert_eq!(timer.display(), "00:25:00");
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn test_zero_duration_does_not_start() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualDateProvider::new(start_time()));
        let mut timer = timer(&store, &clock);
        timer.set_duration(0, 0);
        assert!(!timer.start());
    }

    #[test]
    fn test_write_failure_still_finishes() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_writes(true);
        let clock = Arc::new(ManualDateProvider::new(start_time()));
        let mut timer = timer(&store, &clock);
        timer.set_duration(0, 1);
        timer.start();

        assert!(run_ticks(&mut timer, &clock, 60));
        assert_eq!(timer.state(), CountdownState::Finished);
        assert!(store.sessions().is_empty());
    }
}
