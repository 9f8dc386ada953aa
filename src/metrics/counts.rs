use crate::metrics::round_average;
use crate::quiz_attempt::QuizAttempt;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuizCounts {
    pub count: usize,
    pub total_questions: u64,
    pub total_correct: u64,
    pub total_wrong: u64,
}

/// Straight sums over the attempt history. An empty history yields all zeros.
pub fn compute_quiz_counts(attempts: &[QuizAttempt]) -> QuizCounts {
    attempts.iter().fold(
        QuizCounts {
            count: attempts.len(),
            ..QuizCounts::default()
        },
        |mut counts, attempt| {
            counts.total_questions += u64::from(attempt.total_questions);
            counts.total_correct += u64::from(attempt.correct_answers);
            counts.total_wrong += u64::from(attempt.wrong_answers);
            counts
        },
    )
}

/// Mean score over every attempt, rounded to the nearest integer (0 for no attempts)
pub fn compute_average_score(attempts: &[QuizAttempt]) -> u32 {
    let total: u64 = attempts.iter().map(|a| u64::from(a.score)).sum();
    round_average(total, attempts.len())
}

/// Distinct chapter labels in first-seen order
pub fn compute_chapters_completed(attempts: &[QuizAttempt]) -> Vec<String> {
    let mut chapters: Vec<String> = Vec::new();
    for chapter in attempts
        .iter()
        .filter_map(|a| a.chapter.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        if !chapters.iter().any(|seen| seen == chapter) {
            chapters.push(chapter.to_string());
        }
    }
    chapters
}
