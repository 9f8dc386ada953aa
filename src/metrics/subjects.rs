use crate::metrics::round_average;
use crate::quiz_attempt::QuizAttempt;
use serde::Serialize;
use std::collections::HashMap;

/// Average score of one subject across its attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectProgress {
    pub subject: String,
    pub average_score: u32,
    pub attempts: usize,
    #[serde(skip)]
    total_score: u64,
}

impl SubjectProgress {
    pub fn new(subject: impl Into<String>, total_score: u64, attempts: usize) -> Self {
        SubjectProgress {
            subject: subject.into(),
            average_score: round_average(total_score, attempts),
            attempts,
            total_score,
        }
    }

    /// Unrounded mean, used for ranking so 84.6 still beats 84.4
    pub fn mean_score(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.total_score as f64 / self.attempts as f64
        }
    }
}

/// Group attempts by subject label and average each group, preserving the order in
/// which subjects are first seen. Attempts without a label are left out.
pub fn compute_subject_progress(attempts: &[QuizAttempt]) -> Vec<SubjectProgress> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (u64, usize)> = HashMap::new();

    for attempt in attempts {
        let Some(subject) = attempt.subject_label() else {
            continue;
        };
        let entry = totals.entry(subject).or_insert_with(|| {
            order.push(subject);
            (0, 0)
        });
        entry.0 += u64::from(attempt.score);
        entry.1 += 1;
    }

    order
        .into_iter()
        .map(|subject| {
            let (total, count) = totals[subject];
            SubjectProgress::new(subject, total, count)
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectExtremes {
    pub strongest: Option<String>,
    pub weakest: Option<String>,
}

/// Subjects with the highest and lowest average. Ties go to the subject seen first.
/// Subjects without attempts never take part.
pub fn compute_strongest_and_weakest(progress: &[SubjectProgress]) -> SubjectExtremes {
    let mut strongest: Option<&SubjectProgress> = None;
    let mut weakest: Option<&SubjectProgress> = None;

    for subject in progress.iter().filter(|p| p.attempts > 0) {
        if strongest.is_none_or(|best| subject.mean_score() > best.mean_score()) {
            strongest = Some(subject);
        }
        if weakest.is_none_or(|worst| subject.mean_score() < worst.mean_score()) {
            weakest = Some(subject);
        }
    }

    SubjectExtremes {
        strongest: strongest.map(|p| p.subject.clone()),
        weakest: weakest.map(|p| p.subject.clone()),
    }
}
