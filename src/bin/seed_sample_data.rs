use chrono::{Duration, Utc};
use gyaan_progress::database::Database;
use gyaan_progress::quiz_attempt::NewQuizAttempt;
use gyaan_progress::store::ProgressStore;
use gyaan_progress::study_session::{NewStudySession, PAGE_PRESENCE, POMODORO_TIMER};
use rand::Rng;
use rand::seq::SliceRandom;
use std::env;

const CHAPTERS: [&str; 8] = [
    "Math Algebra",
    "Math Geometry",
    "Math Statistics",
    "Science Physics",
    "Science Chemistry",
    "Science Biology",
    "English Grammar",
    "History-French Revolution",
];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <database_file> [user_id]", args[0]);
        eprintln!();
        eprintln!("Fills a database with three weeks of quiz attempts and study sessions.");
        eprintln!();
        eprintln!("Example: {} /tmp/gyaan_sample.db student-1", args[0]);
        std::process::exit(1);
    }

    let db_path = &args[1];
    let user_id = args.get(2).map(String::as_str).unwrap_or("student-1");

    let db = match Database::new(db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            std::process::exit(1);
        }
    };

    let mut rng = rand::thread_rng();
    let today = Utc::now();
    let mut attempts = 0;
    let mut sessions = 0;

    for days_ago in (0..21).rev() {
        // Leave some days empty so streaks break
        if rng.gen_bool(0.25) {
            continue;
        }
        let day = today - Duration::days(days_ago);

        for _ in 0..rng.gen_range(1..=3) {
            let chapter = CHAPTERS.choose(&mut rng).copied().unwrap_or("Math Algebra");
            let total_questions: u32 = 10;
            let correct_answers = rng.gen_range(3..=total_questions);
            let attempt = NewQuizAttempt {
                user_id: user_id.to_string(),
                subject: None,
                chapter: Some(chapter.to_string()),
                score: correct_answers * 100 / total_questions,
                correct_answers,
                wrong_answers: total_questions - correct_answers,
                total_questions,
                time_taken_seconds: rng.gen_range(120..=900),
                created_at: day - Duration::minutes(rng.gen_range(0..600)),
            };
            if let Err(e) = db.insert_quiz_attempt(&attempt) {
                eprintln!("Error inserting quiz attempt: {}", e);
                std::process::exit(1);
            }
            attempts += 1;
        }

        let duration_seconds: u32 = rng.gen_range(300..=5400);
        let start_time = day - Duration::seconds(i64::from(duration_seconds) + 3600);
        let study_type = if rng.gen_bool(0.3) {
            POMODORO_TIMER
        } else {
            PAGE_PRESENCE
        };
        let session = NewStudySession {
            user_id: user_id.to_string(),
            start_time,
            end_time: start_time + Duration::seconds(i64::from(duration_seconds)),
            duration_seconds,
            study_type: study_type.to_string(),
        };
        if let Err(e) = db.insert_study_session(&session) {
            eprintln!("Error inserting study session: {}", e);
            std::process::exit(1);
        }
        sessions += 1;
    }

    println!(
        "Sample database created at {} with {} quiz attempts and {} study sessions for {}",
        db_path, attempts, sessions, user_id
    );
}
