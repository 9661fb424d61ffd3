//! Question catalog model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// A single answer option on an objective question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// Question database model
///
/// Correct-answer data (`options[].is_correct`) must never reach the
/// session-facing API; handlers serialize sanitized views instead.
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub question_type: String,
    pub question_text: String,
    pub options: Json<Vec<QuestionOption>>,
    pub marks: f64,
    pub negative_marks: f64,
}

impl Question {
    /// Text of the option flagged correct, if any
    pub fn correct_option_text(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.is_correct)
            .map(|o| o.text.as_str())
    }
}

/// Question type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    Mcq,
    TrueFalse,
    Descriptive,
    Coding,
}

impl QuestionType {
    /// Get type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::TrueFalse => "true_false",
            Self::Descriptive => "descriptive",
            Self::Coding => "coding",
        }
    }

    /// Parse type from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mcq" => Some(Self::Mcq),
            "true_false" => Some(Self::TrueFalse),
            "descriptive" => Some(Self::Descriptive),
            "coding" => Some(Self::Coding),
            _ => None,
        }
    }

    /// Objective types are graded inline by the evaluation rule; the rest
    /// wait on the external grading delegate.
    pub fn is_objective(&self) -> bool {
        matches!(self, Self::Mcq | Self::TrueFalse)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A question assigned to an exam, in its authored position
#[derive(Debug, Clone, FromRow)]
pub struct AssignedQuestion {
    #[sqlx(flatten)]
    pub question: Question,
    pub position: i32,
    /// Per-exam marks override; `None` means use the question's own marks
    pub marks_override: Option<f64>,
}

impl AssignedQuestion {
    /// Marks this question is worth on this exam
    pub fn effective_marks(&self) -> f64 {
        self.marks_override.unwrap_or(self.question.marks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(options: Vec<(&str, bool)>) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_type: "mcq".to_string(),
            question_text: "Pick one".to_string(),
            options: Json(
                options
                    .into_iter()
                    .map(|(text, is_correct)| QuestionOption {
                        text: text.to_string(),
                        is_correct,
                    })
                    .collect(),
            ),
            marks: 5.0,
            negative_marks: 0.0,
        }
    }

    #[test]
    fn test_correct_option_text() {
        let q = mcq(vec![("a", false), ("b", true), ("c", false)]);
        assert_eq!(q.correct_option_text(), Some("b"));
        assert_eq!(mcq(vec![("a", false)]).correct_option_text(), None);
    }

    #[test]
    fn test_objective_types() {
        assert!(QuestionType::Mcq.is_objective());
        assert!(QuestionType::TrueFalse.is_objective());
        assert!(!QuestionType::Descriptive.is_objective());
        assert!(!QuestionType::Coding.is_objective());
    }

    #[test]
    fn test_effective_marks_override() {
        let assigned = AssignedQuestion {
            question: mcq(vec![("a", true)]),
            position: 0,
            marks_override: Some(10.0),
        };
        assert_eq!(assigned.effective_marks(), 10.0);

        let plain = AssignedQuestion {
            question: mcq(vec![("a", true)]),
            position: 1,
            marks_override: None,
        };
        assert_eq!(plain.effective_marks(), 5.0);
    }
}
