//! Exam session model
//!
//! A session is the single attempt a student gets at an exam. Answers and
//! violations live on the row as JSONB documents so that submission and
//! violation logging can race against one `version` token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::constants::violation_types;

/// One answer slot per assigned question, created at session start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub marks_awarded: f64,
    #[serde(default)]
    pub is_evaluated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Answer {
    /// Empty answer slot for a question, created at session start
    pub fn skeleton(question_id: Uuid) -> Self {
        Self {
            question_id,
            selected_answer: None,
            text_answer: None,
            code_answer: None,
            is_correct: None,
            marks_awarded: 0.0,
            is_evaluated: false,
            evaluated_by: None,
            evaluated_at: None,
            feedback: None,
        }
    }
}

/// Append-only proctoring violation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub violation_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Violation {
    /// Tab-switch events come in two spellings from older clients
    pub fn is_tab_switch(&self) -> bool {
        self.violation_type == violation_types::TAB_SWITCH
            || self.violation_type == violation_types::TAB_CHANGE
    }

    pub fn is_fullscreen_exit(&self) -> bool {
        self.violation_type == violation_types::FULLSCREEN_EXIT
    }
}

/// Session database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub student_id: Uuid,
    pub exam_id: Uuid,
    pub answers: Json<Vec<Answer>>,
    pub score: f64,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub total_time_minutes: Option<i32>,
    pub auto_submitted: bool,
    pub remarks: Option<String>,
    pub violations: Json<Vec<Violation>>,
    pub tab_switch_count: i32,
    pub unlock_requested: bool,
    pub unlock_reason: Option<String>,
    pub unlock_requested_at: Option<DateTime<Utc>>,
    pub unlock_status: String,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn percentage(&self, total_marks: f64) -> f64 {
        if total_marks > 0.0 {
            self.score / total_marks * 100.0
        } else {
            0.0
        }
    }

    pub fn is_passed(&self, passing_marks: f64) -> bool {
        self.score >= passing_marks
    }

    /// Seconds left on the clock, floored at zero
    pub fn remaining_seconds(&self, duration_minutes: i32, now: DateTime<Utc>) -> i64 {
        let elapsed = (now - self.started_at).num_seconds();
        (duration_minutes as i64 * 60 - elapsed).max(0)
    }

    /// Fullscreen-exit count is derived by filtering, never decremented
    pub fn fullscreen_exit_count(&self) -> i32 {
        self.violations
            .iter()
            .filter(|v| v.is_fullscreen_exit())
            .count() as i32
    }
}

/// Session lifecycle status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    InProgress,
    Submitted,
    PendingEvaluation,
    Evaluated,
    Locked,
}

impl SessionStatus {
    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::PendingEvaluation => "pending_evaluation",
            Self::Evaluated => "evaluated",
            Self::Locked => "locked",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(Self::InProgress),
            "submitted" => Some(Self::Submitted),
            "pending_evaluation" => Some(Self::PendingEvaluation),
            "evaluated" => Some(Self::Evaluated),
            "locked" => Some(Self::Locked),
            _ => None,
        }
    }

    /// Terminal for the student-driven path (no further answers accepted)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_with_answers(answers: Vec<Answer>) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            answers: Json(answers),
            score: 0.0,
            status: "in_progress".to_string(),
            started_at: now,
            submitted_at: None,
            total_time_minutes: None,
            auto_submitted: false,
            remarks: None,
            violations: Json(Vec::new()),
            tab_switch_count: 0,
            unlock_requested: false,
            unlock_reason: None,
            unlock_requested_at: None,
            unlock_status: "none".to_string(),
            version: 1,
            updated_at: now,
        }
    }

    #[test]
    fn test_remaining_seconds_floors_at_zero() {
        let mut session = session_with_answers(Vec::new());
        session.started_at = Utc::now() - Duration::minutes(90);
        assert_eq!(session.remaining_seconds(60, Utc::now()), 0);

        session.started_at = Utc::now() - Duration::minutes(10);
        let remaining = session.remaining_seconds(60, Utc::now());
        assert!(remaining > 0 && remaining <= 50 * 60);
    }

    #[test]
    fn test_fullscreen_exit_count_derived_by_filter() {
        let mut session = session_with_answers(Vec::new());
        session.violations = Json(vec![
            Violation {
                violation_type: "tab_switch".to_string(),
                timestamp: Utc::now(),
                description: None,
            },
            Violation {
                violation_type: "fullscreen_exit".to_string(),
                timestamp: Utc::now(),
                description: None,
            },
            Violation {
                violation_type: "fullscreen_exit".to_string(),
                timestamp: Utc::now(),
                description: None,
            },
        ]);
        assert_eq!(session.fullscreen_exit_count(), 2);
    }

    #[test]
    fn test_tab_switch_spellings() {
        let v = Violation {
            violation_type: "tab_change".to_string(),
            timestamp: Utc::now(),
            description: None,
        };
        assert!(v.is_tab_switch());
        assert!(!v.is_fullscreen_exit());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Submitted.is_terminal());
        assert!(SessionStatus::Locked.is_terminal());
        assert!(SessionStatus::Evaluated.is_terminal());
    }
}
