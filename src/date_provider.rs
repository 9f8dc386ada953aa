use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use std::sync::Mutex;

/// Trait for providing the current date/time to the aggregator and the trackers
/// This allows for flexible date handling (system time, overrides, tests)
pub trait DateProvider: Send + Sync {
    /// Get the current date/time
    fn get_current_time(&self) -> DateTime<Utc>;
}

/// Default date provider that uses the system's current date/time
pub struct SystemDateProvider;

impl DateProvider for SystemDateProvider {
    fn get_current_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Date provider that uses an overridden date instead of system time
/// Preserves the current hours/minutes/seconds from system time
pub struct OverrideDateProvider {
    override_date: NaiveDate,
}

impl OverrideDateProvider {
    /// Create a new override date provider with a specific date
    pub fn new(override_date: NaiveDate) -> Self {
        Self { override_date }
    }
}

impl DateProvider for OverrideDateProvider {
    fn get_current_time(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let naive_datetime = self
            .override_date
            .and_hms_opt(now.hour(), now.minute(), now.second())
            .unwrap_or_else(|| self.override_date.and_time(chrono::NaiveTime::MIN));
        DateTime::from_naive_utc_and_offset(naive_datetime, Utc)
    }
}

/// Clock that only moves when told to. Used to drive the trackers deterministically.
pub struct ManualDateProvider {
    now: Mutex<DateTime<Utc>>,
}

impl ManualDateProvider {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl DateProvider for ManualDateProvider {
    fn get_current_time(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_date_provider_returns_current_time() {
        let provider = SystemDateProvider;
        let time1 = provider.get_current_time();
        let time2 = provider.get_current_time();

        // Times should be very close (within a second)
        assert!((time2 - time1).num_seconds() <= 1);
    }

    #[test]
    fn test_override_date_provider_uses_override_date() {
        let override_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let provider = OverrideDateProvider::new(override_date);
        let time = provider.get_current_time();

        assert_eq!(time.format("%Y-%m-%d").to_string(), "2024-01-15");
    }

    #[test]
    fn test_manual_date_provider_set_and_advance() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        let provider = ManualDateProvider::new(start);
        assert_eq!(provider.get_current_time(), start);

        provider.advance(Duration::minutes(10));
        assert_eq!(provider.get_current_time(), start + Duration::minutes(10));

        provider.set(start);
        assert_eq!(provider.get_current_time(), start);
    }
}
