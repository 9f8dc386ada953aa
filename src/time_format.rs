use chrono::Duration;

/// Formats a month-to-date study total for the compact dashboard indicator
///
/// Examples:
/// - 0 minutes: "0h 0m"
/// - 30 minutes: "0h 30m"
/// - 90 minutes: "1h 30m"
/// - 125 minutes: "2h 5m"
///
/// Partial minutes are truncated. Negative durations render as "0h 0m".
pub fn format_study_total(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

/// Formats a duration as a zero-padded "HH:MM:SS" clock for the countdown timer
///
/// Hours are not wrapped at 24, so a 30 hour span renders as "30:00:00".
pub fn format_clock(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Signed change with an explicit sign, e.g. "+3", "-2", "0"
pub fn format_delta(delta: i64) -> String {
    if delta > 0 {
        format!("+{}", delta)
    } else {
        delta.to_string()
    }
}
