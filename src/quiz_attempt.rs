use chrono::{DateTime, Utc};
use serde::Serialize;

/// One completed quiz submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: String,
    /// Explicit subject label, when the quiz-taking side recorded one
    pub subject: Option<String>,
    /// Free-text chapter label, e.g. "Math Algebra"
    pub chapter: Option<String>,
    /// Percentage score, 0-100
    pub score: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub total_questions: u32,
    pub time_taken_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl QuizAttempt {
    /// Subject this attempt counts towards in the per-subject breakdown.
    ///
    /// The explicit `subject` field wins. Otherwise the subject is the chapter text
    /// before its first separator (whitespace or '-'). Attempts without a usable
    /// label return `None`.
    pub fn subject_label(&self) -> Option<&str> {
        match self.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => Some(subject),
            _ => self.chapter.as_deref().and_then(subject_from_chapter),
        }
    }
}

/// Derive the subject from a chapter label such as "Math Algebra" or "Science-Physics"
pub fn subject_from_chapter(chapter: &str) -> Option<&str> {
    let trimmed = chapter.trim();
    let subject = trimmed
        .split(|c: char| c.is_whitespace() || c == '-')
        .next()
        .unwrap_or("")
        .trim();
    if subject.is_empty() { None } else { Some(subject) }
}

/// A quiz attempt that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuizAttempt {
    pub user_id: String,
    pub subject: Option<String>,
    pub chapter: Option<String>,
    pub score: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub total_questions: u32,
    pub time_taken_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl NewQuizAttempt {
    pub fn into_attempt(self, id: i64) -> QuizAttempt {
        QuizAttempt {
            id,
            user_id: self.user_id,
            subject: self.subject,
            chapter: self.chapter,
            score: self.score.min(100),
            correct_answers: self.correct_answers,
            wrong_answers: self.wrong_answers,
            total_questions: self.total_questions,
            time_taken_seconds: self.time_taken_seconds,
            created_at: self.created_at,
        }
    }
}
