use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use crate::config::QuestionDef;

const DEFAULT_CORRECT_FEEDBACK: &str = "Correct. Data verified.";
const DEFAULT_WRONG_FEEDBACK: &str = "Incorrect. Cross-check the data and try again.";

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("quiz opened with no questions")]
    NoQuestions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub text: String,
    pub enabled: bool,
    pub marked_wrong: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizSignal {
    Feedback { text: String, correct: bool },
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    Ask(QuestionPrompt),
    Finished { total_questions: u32, mistakes: u32 },
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizPhase {
    Answering,
    FeedbackCorrect,
    FeedbackWrong,
    Reporting,
    Complete,
}

/// One quiz run. Selections and dismissals come in as calls and go out as
/// signal values; the session never talks to the presentation layer itself.
#[derive(Debug)]
pub struct QuizSession {
    questions: Vec<QuestionDef>,
    current: usize,
    mistakes: u32,
    wrong_options: HashSet<usize>,
    phase: QuizPhase,
}

impl QuizSession {
    pub fn new(questions: Vec<QuestionDef>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        Ok(Self {
            questions,
            current: 0,
            mistakes: 0,
            wrong_options: HashSet::new(),
            phase: QuizPhase::Answering,
        })
    }

    pub fn current_prompt(&self) -> Option<QuestionPrompt> {
        if !matches!(self.phase, QuizPhase::Answering) {
            return None;
        }
        self.questions.get(self.current).map(|question| {
            let options = question
                .options
                .iter()
                .enumerate()
                .map(|(index, option)| OptionView {
                    text: option.text.clone(),
                    enabled: !self.wrong_options.contains(&index),
                    marked_wrong: self.wrong_options.contains(&index),
                })
                .collect();
            QuestionPrompt {
                index: self.current,
                total: self.questions.len(),
                text: question.text.clone(),
                options,
            }
        })
    }

    /// Any selection locks the question until the feedback is dismissed, so
    /// a double submission cannot land.
    pub fn select_option(&mut self, index: usize) -> QuizSignal {
        if !matches!(self.phase, QuizPhase::Answering) {
            return QuizSignal::Rejected;
        }
        let Some(question) = self.questions.get(self.current) else {
            return QuizSignal::Rejected;
        };
        let Some(option) = question.options.get(index) else {
            return QuizSignal::Rejected;
        };
        if self.wrong_options.contains(&index) {
            return QuizSignal::Rejected;
        }

        if option.correct {
            self.phase = QuizPhase::FeedbackCorrect;
            QuizSignal::Feedback {
                text: feedback_text(question, index, true),
                correct: true,
            }
        } else {
            self.mistakes = self.mistakes.saturating_add(1);
            self.wrong_options.insert(index);
            self.phase = QuizPhase::FeedbackWrong;
            QuizSignal::Feedback {
                text: feedback_text(question, index, false),
                correct: false,
            }
        }
    }

    pub fn feedback_dismissed(&mut self) -> QuizStep {
        match self.phase {
            QuizPhase::FeedbackCorrect => {
                self.current += 1;
                self.wrong_options.clear();
                if self.current >= self.questions.len() {
                    self.phase = QuizPhase::Reporting;
                    QuizStep::Finished {
                        total_questions: self.questions.len() as u32,
                        mistakes: self.mistakes,
                    }
                } else {
                    self.phase = QuizPhase::Answering;
                    match self.current_prompt() {
                        Some(prompt) => QuizStep::Ask(prompt),
                        None => QuizStep::Rejected,
                    }
                }
            }
            QuizPhase::FeedbackWrong => {
                self.phase = QuizPhase::Answering;
                match self.current_prompt() {
                    Some(prompt) => QuizStep::Ask(prompt),
                    None => QuizStep::Rejected,
                }
            }
            _ => QuizStep::Rejected,
        }
    }

    /// True exactly once, when the shown report is acknowledged.
    pub fn acknowledge_report(&mut self) -> bool {
        if matches!(self.phase, QuizPhase::Reporting) {
            self.phase = QuizPhase::Complete;
            true
        } else {
            false
        }
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn total_questions(&self) -> u32 {
        self.questions.len() as u32
    }
}

fn feedback_text(question: &QuestionDef, option_index: usize, correct: bool) -> String {
    if let Some(text) = question
        .options
        .get(option_index)
        .and_then(|option| option.feedback.clone())
    {
        return text;
    }
    let question_level = if correct {
        question.feedback_correct.clone()
    } else {
        question.feedback_wrong.clone()
    };
    question_level.unwrap_or_else(|| {
        if correct {
            DEFAULT_CORRECT_FEEDBACK.to_string()
        } else {
            DEFAULT_WRONG_FEEDBACK.to_string()
        }
    })
}

pub fn accuracy(total_questions: u32, mistakes: u32) -> u8 {
    if total_questions == 0 {
        return 0;
    }
    let correct = total_questions.saturating_sub(mistakes);
    ((f64::from(correct) / f64::from(total_questions)) * 100.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Perfect,
    Stable,
    Unstable,
}

impl ReportStatus {
    pub fn from_accuracy(accuracy: u8) -> Self {
        if accuracy == 100 {
            ReportStatus::Perfect
        } else if accuracy >= 70 {
            ReportStatus::Stable
        } else {
            ReportStatus::Unstable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Perfect => "perfect",
            ReportStatus::Stable => "stable",
            ReportStatus::Unstable => "unstable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionReport {
    pub elapsed: Duration,
    pub score: u32,
    pub explored_visited: usize,
    pub explored_required: usize,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub accuracy: u8,
    pub status: ReportStatus,
}

impl MissionReport {
    pub fn new(
        elapsed: Duration,
        score: u32,
        explored: (usize, usize),
        total_questions: u32,
        mistakes: u32,
    ) -> Self {
        let accuracy = accuracy(total_questions, mistakes);
        Self {
            elapsed,
            score,
            explored_visited: explored.0,
            explored_required: explored.1,
            correct_answers: total_questions.saturating_sub(mistakes),
            total_questions,
            accuracy,
            status: ReportStatus::from_accuracy(accuracy),
        }
    }
}
