use chrono::Duration;
use gyaan_progress::cli::{Args, Command};
use gyaan_progress::database_factory::{DatabaseConfig, DatabaseFactory};
use gyaan_progress::date_provider::DateProvider;
use gyaan_progress::metrics::MetricsService;
use gyaan_progress::quiz_attempt::NewQuizAttempt;
use gyaan_progress::report::{render_metrics, render_study_time};
use gyaan_progress::study_time::{
    CountdownConfig, CountdownTimer, JsonFileCache, LifecycleEvent, StudyTimeTracker,
    TrackerConfig,
};
use gyaan_progress::time_format::format_study_total;
use log::info;
use std::io::Write;
use std::sync::Arc;
use std::thread;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse_args();
    let override_date = args.validate_override_date()?;
    let offset = args.utc_offset()?;
    let use_color = !args.no_color;
    if args.no_color {
        colored::control::set_override(false);
    }

    let mut db_config = DatabaseConfig::builder().override_date(override_date);
    if args.test {
        db_config = db_config.test_mode();
    }
    if let Some(path) = &args.db_path {
        db_config = db_config.path(path.to_string_lossy());
    }
    let db_config = db_config.build();
    info!("Opening database at {}", db_config.get_path());
    let db = Arc::new(DatabaseFactory::create(db_config)?);
    let clock = db.date_provider();

    let tracker_config = TrackerConfig {
        utc_offset: offset,
        ..TrackerConfig::default()
    };
    let cache = Arc::new(JsonFileCache::new(args.cache_dir()));

    match args.command {
        Command::Metrics { user, json } => {
            let service = MetricsService::new(user, db.clone(), clock, offset);
            let metrics = service.refetch()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                println!("{}", render_metrics(&metrics, use_color));
            }
        }
        Command::StudyTime { user } => {
            let mut tracker =
                StudyTimeTracker::new(user.clone(), db.clone(), cache, clock, tracker_config);
            // Read the total without opening a session
            tracker.handle(LifecycleEvent::Hidden);
            tracker.mount();
            println!(
                "{}",
                render_study_time(&user, tracker.displayed_total(), &[], use_color)
            );
        }
        Command::Track { user, minutes } => {
            let mut tracker =
                StudyTimeTracker::new(user.clone(), db.clone(), cache, clock, tracker_config);
            tracker.mount();
            let target = Duration::minutes(i64::from(minutes));
            let tick = tracker.config().tick_interval;
            let mut elapsed = Duration::zero();
            while elapsed < target {
                let step = tick.min(target - elapsed);
                thread::sleep(step.to_std()?);
                elapsed += step;
                println!("  {}", format_study_total(tracker.tick()));
            }
            tracker.handle(LifecycleEvent::Unload);
            println!(
                "{}",
                render_study_time(
                    &user,
                    tracker.displayed_total(),
                    tracker.new_achievements(),
                    use_color
                )
            );
        }
        Command::Timer {
            user,
            hours,
            minutes,
        } => {
            let mut timer =
                CountdownTimer::new(user, db.clone(), clock, CountdownConfig::default());
            timer.set_duration(hours, minutes);
            if !timer.start() {
                return Err("Timer duration must be greater than zero".into());
            }
            let mut stdout = std::io::stdout();
            loop {
                print!("\r{}", timer.display());
                stdout.flush()?;
                thread::sleep(std::time::Duration::from_secs(1));
                if timer.tick() {
                    break;
                }
            }
            println!("\r{}  done", timer.display());
        }
        Command::RecordAttempt {
            user,
            subject,
            chapter,
            score,
            correct,
            wrong,
            total,
            time_taken,
        } => {
            let attempt = NewQuizAttempt {
                user_id: user,
                subject,
                chapter,
                score,
                correct_answers: correct,
                wrong_answers: wrong,
                total_questions: total,
                time_taken_seconds: time_taken,
                created_at: clock.get_current_time(),
            };
            let id = db.record_quiz_attempt_now(attempt)?;
            println!("Recorded quiz attempt {}", id);
        }
    }

    Ok(())
}
