use crate::error::StoreError;
use crate::metrics::streak::longest_run;
use crate::store::ProgressStore;
use crate::study_session::StudySession;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use log::{info, warn};
use std::collections::BTreeSet;

const ONE_HOUR_CLUB_MINUTES: u64 = 60;
const MARATHON_SECONDS: u32 = 2 * 60 * 60;
const STREAK_DAYS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn as_str(&self) -> &str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Achievement {
    FirstStudySession,
    OneHourClub,
    ThreeDayStreak,
    NightOwl,
    MarathonStudy,
    WeekendWarrior,
}

impl Achievement {
    pub const ALL: [Achievement; 6] = [
        Achievement::FirstStudySession,
        Achievement::OneHourClub,
        Achievement::ThreeDayStreak,
        Achievement::NightOwl,
        Achievement::MarathonStudy,
        Achievement::WeekendWarrior,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::FirstStudySession => "First Study Session",
            Achievement::OneHourClub => "1 Hour Club",
            Achievement::ThreeDayStreak => "3-Day Streak",
            Achievement::NightOwl => "Night Owl",
            Achievement::MarathonStudy => "Marathon Study",
            Achievement::WeekendWarrior => "Weekend Warrior",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstStudySession => "Completed your first study session!",
            Achievement::OneHourClub => "Studied for 1 hour in total!",
            Achievement::ThreeDayStreak => "Studied 3 days in a row!",
            Achievement::NightOwl => "Studied between 12AM and 3AM!",
            Achievement::MarathonStudy => "Studied for 2+ hours in one session!",
            Achievement::WeekendWarrior => "Studied on a weekend!",
        }
    }

    /// Badge shown next to the title
    pub fn icon(&self) -> &'static str {
        match self {
            Achievement::FirstStudySession => "🎉",
            Achievement::OneHourClub => "⏰",
            Achievement::ThreeDayStreak => "🔥",
            Achievement::NightOwl => "🦉",
            Achievement::MarathonStudy => "🏃",
            Achievement::WeekendWarrior => "💪",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Achievement::FirstStudySession | Achievement::NightOwl | Achievement::WeekendWarrior => {
                Tier::Bronze
            }
            Achievement::OneHourClub | Achievement::ThreeDayStreak => Tier::Silver,
            Achievement::MarathonStudy => Tier::Gold,
        }
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Achievement::ALL.into_iter().find(|a| a.title() == title)
    }
}

/// Achievements earned given the user's sessions (including the one that just closed),
/// the local end time of that session and its duration
pub fn evaluate_achievements<Tz: TimeZone>(
    sessions: &[StudySession],
    session_end: &DateTime<Tz>,
    session_duration_seconds: u32,
) -> Vec<Achievement> {
    let mut earned = Vec::new();

    if !sessions.is_empty() {
        earned.push(Achievement::FirstStudySession);
    }

    let total_seconds: u64 = sessions.iter().map(|s| u64::from(s.duration_seconds)).sum();
    if total_seconds / 60 >= ONE_HOUR_CLUB_MINUTES {
        earned.push(Achievement::OneHourClub);
    }

    let tz = session_end.timezone();
    let days: Vec<NaiveDate> = sessions
        .iter()
        .map(|s| s.start_time.with_timezone(&tz).date_naive())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if longest_run(&days) >= STREAK_DAYS {
        earned.push(Achievement::ThreeDayStreak);
    }

    if session_end.hour() < 3 {
        earned.push(Achievement::NightOwl);
    }

    if session_duration_seconds >= MARATHON_SECONDS {
        earned.push(Achievement::MarathonStudy);
    }

    if matches!(session_end.weekday(), Weekday::Sat | Weekday::Sun) {
        earned.push(Achievement::WeekendWarrior);
    }

    earned
}

/// Evaluate and grant achievements after a session closed. Returns the newly granted ones.
pub fn award_after_session<Tz: TimeZone>(
    store: &dyn ProgressStore,
    user_id: &str,
    session_end: DateTime<Utc>,
    session_duration_seconds: u32,
    tz: &Tz,
) -> Result<Vec<Achievement>, StoreError> {
    let sessions = store.study_sessions_since(user_id, DateTime::<Utc>::UNIX_EPOCH)?;
    let local_end = session_end.with_timezone(tz);

    let mut granted = Vec::new();
    for achievement in evaluate_achievements(&sessions, &local_end, session_duration_seconds) {
        if store.has_achievement(user_id, achievement.title())? {
            continue;
        }
        match store.grant_achievement(user_id, &achievement, session_end) {
            Ok(true) => {
                info!("Granted '{}' to {}", achievement.title(), user_id);
                granted.push(achievement);
            }
            Ok(false) => {}
            Err(e) => warn!("Could not grant '{}': {}", achievement.title(), e),
        }
    }
    Ok(granted)
}
