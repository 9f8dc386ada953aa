use crate::metrics::DerivedMetrics;
use crate::study_time::achievements::{Achievement, Tier};
use crate::time_format::{format_delta, format_study_total};
use chrono::Duration;
use colored::Colorize;

const LABEL_WIDTH: usize = 20;

/// Renders the progress dashboard as plain text, optionally with terminal colors
pub fn render_metrics(metrics: &DerivedMetrics, use_color: bool) -> String {
    let mut lines = Vec::new();

    let title = format!(
        "Progress report for {} ({})",
        metrics.user_id, metrics.as_of
    );
    lines.push(bold(&title, use_color));
    lines.push("=".repeat(title.len()));

    lines.push(row(
        "Quizzes attempted",
        format!(
            "{} ({} vs last week)",
            metrics.quizzes_attempted,
            delta(metrics.deltas.quizzes_delta_last_week, use_color)
        ),
    ));
    lines.push(row(
        "Questions solved",
        format!(
            "{} ({} vs yesterday)",
            metrics.total_questions_solved,
            delta(metrics.deltas.questions_delta_yesterday, use_color)
        ),
    ));
    lines.push(row(
        "Correct / wrong",
        format!("{} / {}", metrics.total_correct, metrics.total_wrong),
    ));
    lines.push(row("Average score", format!("{}%", metrics.average_score)));
    lines.push(row(
        "Current streak",
        plural(metrics.current_streak as usize, "day", "days"),
    ));

    let strongest = metrics.strongest_subject.as_deref().unwrap_or("-");
    let weakest = metrics.improvement_needed.as_deref().unwrap_or("-");
    lines.push(row(
        "Strongest subject",
        if use_color {
            strongest.green().to_string()
        } else {
            strongest.to_string()
        },
    ));
    lines.push(row(
        "Needs improvement",
        if use_color {
            weakest.yellow().to_string()
        } else {
            weakest.to_string()
        },
    ));

    lines.push(String::new());
    lines.push(bold("Last 7 days", use_color));
    for day in &metrics.weekly_breakdown {
        lines.push(format!(
            "  {}  {:>3}%",
            day.date.format("%a %d %b"),
            day.average_score
        ));
    }

    lines.push(String::new());
    lines.push(bold("Subjects", use_color));
    if metrics.subject_progress.is_empty() {
        lines.push("  (none)".to_string());
    }
    for subject in &metrics.subject_progress {
        lines.push(format!(
            "  {:<12}{:>3}%  {}",
            subject.subject,
            subject.average_score,
            plural(subject.attempts, "attempt", "attempts")
        ));
    }

    lines.push(String::new());
    lines.push(bold("Recent quizzes", use_color));
    if metrics.recent_quizzes.is_empty() {
        lines.push("  (none)".to_string());
    }
    for attempt in &metrics.recent_quizzes {
        let label = attempt
            .chapter
            .as_deref()
            .or(attempt.subject_label())
            .unwrap_or("-");
        lines.push(format!(
            "  {}  {:>3}%  {}",
            attempt
                .created_at
                .with_timezone(&metrics.utc_offset)
                .format("%Y-%m-%d"),
            attempt.score,
            label
        ));
    }

    lines.join("\n")
}

/// Renders the month-to-date study total and any newly granted achievements
pub fn render_study_time(
    user_id: &str,
    total: Duration,
    achievements: &[Achievement],
    use_color: bool,
) -> String {
    let mut lines = vec![format!(
        "Study time this month for {}: {}",
        user_id,
        bold(&format_study_total(total), use_color)
    )];
    for achievement in achievements {
        let tier = format!("[{}]", achievement.tier().as_str());
        let tier = if use_color {
            match achievement.tier() {
                Tier::Gold => tier.yellow().bold().to_string(),
                Tier::Silver => tier.white().bold().to_string(),
                Tier::Bronze => tier.red().to_string(),
            }
        } else {
            tier
        };
        lines.push(format!(
            "  {} {} {} - {}",
            tier,
            achievement.icon(),
            achievement.title(),
            achievement.description()
        ));
    }
    lines.join("\n")
}

fn row(label: &str, value: String) -> String {
    format!("{:<width$}{}", label, value, width = LABEL_WIDTH)
}

fn bold(text: &str, use_color: bool) -> String {
    if use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn delta(value: i64, use_color: bool) -> String {
    let text = format_delta(value);
    if !use_color {
        return text;
    }
    match value.signum() {
        1 => text.green().to_string(),
        -1 => text.red().to_string(),
        _ => text,
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}
