use chrono::{FixedOffset, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quiz progress dashboard and study time tracking for Gyaan students
#[derive(Parser, Debug, Clone)]
#[command(name = "gyaan_progress")]
#[command(about = "Track quiz progress and study time", long_about = None)]
#[command(version)]
pub struct Args {
    /// Use in-memory database for testing
    #[arg(long, global = true, help = "Use in-memory database for testing")]
    pub test: bool,

    /// Custom database file path
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Use custom database file path"
    )]
    pub db_path: Option<PathBuf>,

    /// Override current date for testing (YYYY-MM-DD format)
    #[arg(
        long,
        global = true,
        value_name = "DATE",
        help = "Override current date (YYYY-MM-DD format)"
    )]
    pub override_date: Option<String>,

    /// Offset used for calendar days and months, e.g. +05:30
    #[arg(long, global = true, value_name = "OFFSET", allow_hyphen_values = true)]
    pub utc_offset: Option<String>,

    /// Directory holding the local study time cache
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the progress dashboard
    Metrics {
        #[arg(long)]
        user: String,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the study time recorded this month
    StudyTime {
        #[arg(long)]
        user: String,
    },
    /// Track study time for a number of minutes
    Track {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 25)]
        minutes: u32,
    },
    /// Run a countdown timer and record it as a study session
    Timer {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 0)]
        hours: u32,
        #[arg(long, default_value_t = 25)]
        minutes: u32,
    },
    /// Record a completed quiz attempt
    RecordAttempt {
        #[arg(long)]
        user: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        chapter: Option<String>,
        #[arg(long)]
        score: u32,
        #[arg(long)]
        correct: u32,
        #[arg(long)]
        wrong: u32,
        #[arg(long)]
        total: u32,
        #[arg(long, default_value_t = 0)]
        time_taken: u32,
    },
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the override_date argument if provided
    pub fn validate_override_date(&self) -> Result<Option<NaiveDate>, String> {
        match &self.override_date {
            Some(date_str) => NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    format!(
                        "Invalid date format for --override-date: '{}'. Expected YYYY-MM-DD",
                        date_str
                    )
                }),
            None => Ok(None),
        }
    }

    /// The --utc-offset argument, or the machine's local offset
    pub fn utc_offset(&self) -> Result<FixedOffset, String> {
        match &self.utc_offset {
            Some(value) => parse_utc_offset(value),
            None => Ok(*Local::now().offset()),
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".gyaan_cache"))
    }
}

/// Parse "+HH:MM", "-HH:MM" or "Z"
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let invalid = || {
        format!(
            "Invalid offset for --utc-offset: '{}'. Expected +HH:MM or -HH:MM",
            value
        )
    };
    if value == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || !(0..60).contains(&minutes) {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
