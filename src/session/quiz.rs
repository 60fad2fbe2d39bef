//! Interactive quiz: answer, submit, score.

use crate::artifact::QuizArtifact;
use crate::error::StudyError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Final score of a submitted quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    /// Rounded percentage of correct answers; 0 for an empty quiz.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// How a single option should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Not selected (while answering), or neither selected nor correct (after).
    Plain,
    /// Selected while still answering.
    Selected,
    /// After submission: this is the correct option.
    Correct,
    /// After submission: selected, but wrong.
    Wrong,
}

/// A quiz plus the user's answers.
///
/// Answers are overwritable until [`QuizView::submit`] succeeds; from then on
/// the view is read-only and correctness is revealed through
/// [`QuizView::mark`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuizView {
    quiz: QuizArtifact,
    answers: BTreeMap<usize, usize>,
    score: Option<QuizScore>,
}

impl QuizView {
    pub fn new(quiz: QuizArtifact) -> Self {
        Self {
            quiz,
            answers: BTreeMap::new(),
            score: None,
        }
    }

    pub fn artifact(&self) -> &QuizArtifact {
        &self.quiz
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.score.is_some()
    }

    /// Select option `option` for question `question` (both 0-based).
    pub fn select(&mut self, question: usize, option: usize) -> Result<(), StudyError> {
        if self.is_submitted() {
            return Err(StudyError::usage("answers are locked after submission"));
        }
        let q = self.quiz.questions.get(question).ok_or_else(|| {
            StudyError::usage(format!(
                "question {} does not exist (quiz has {})",
                question + 1,
                self.quiz.questions.len()
            ))
        })?;
        if option >= q.options.len() {
            return Err(StudyError::usage(format!(
                "option {} does not exist (question {} has {})",
                option + 1,
                question + 1,
                q.options.len()
            )));
        }
        self.answers.insert(question, option);
        Ok(())
    }

    /// The option selected for `question`, if any.
    pub fn answer(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Lock the answers and compute the score.
    ///
    /// Every question must be answered first; otherwise nothing changes and a
    /// usage error is returned. Submitting again returns the same score.
    pub fn submit(&mut self) -> Result<QuizScore, StudyError> {
        if let Some(score) = self.score {
            return Ok(score);
        }
        let total = self.quiz.questions.len();
        if self.answers.len() < total {
            return Err(StudyError::usage(format!(
                "please answer all questions before submitting ({}/{} answered)",
                self.answers.len(),
                total
            )));
        }
        let correct = self
            .quiz
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| {
                self.answers
                    .get(i)
                    .is_some_and(|&sel| i64::try_from(sel).is_ok_and(|s| s == q.correct_answer))
            })
            .count();
        let score = QuizScore { correct, total };
        self.score = Some(score);
        Ok(score)
    }

    pub fn score(&self) -> Option<QuizScore> {
        self.score
    }

    /// Whether `question` was answered correctly; `None` before submission.
    pub fn is_correct(&self, question: usize) -> Option<bool> {
        self.score?;
        let q = self.quiz.questions.get(question)?;
        Some(self.answer(question).is_some() && self.answer(question) == q.correct_option())
    }

    /// Display state for option `option` of `question`.
    ///
    /// A question whose `correctAnswer` points outside its options has no
    /// option marked [`OptionMark::Correct`].
    pub fn mark(&self, question: usize, option: usize) -> OptionMark {
        let selected = self.answer(question) == Some(option);
        if !self.is_submitted() {
            return if selected {
                OptionMark::Selected
            } else {
                OptionMark::Plain
            };
        }
        let correct = self
            .quiz
            .questions
            .get(question)
            .and_then(|q| q.correct_option())
            == Some(option);
        match (correct, selected) {
            (true, _) => OptionMark::Correct,
            (false, true) => OptionMark::Wrong,
            (false, false) => OptionMark::Plain,
        }
    }
}
