//! Session response DTOs
//!
//! Views never carry grading internals (correct flags, awarded marks)
//! unless the exam has published results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::exams::response::QuestionView;
use crate::models::{Exam, Session};

/// Student view of one answer slot (saved content only)
#[derive(Debug, Serialize)]
pub struct AnswerView {
    pub question_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_answer: Option<String>,
}

/// Student view of a session
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub total_time_minutes: Option<i32>,
    pub auto_submitted: bool,
    pub tab_switch_count: i32,
    pub violation_count: usize,
    pub unlock_requested: bool,
    pub unlock_status: String,
    pub answers: Vec<AnswerView>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            exam_id: session.exam_id,
            status: session.status.clone(),
            started_at: session.started_at,
            submitted_at: session.submitted_at,
            total_time_minutes: session.total_time_minutes,
            auto_submitted: session.auto_submitted,
            tab_switch_count: session.tab_switch_count,
            violation_count: session.violations.len(),
            unlock_requested: session.unlock_requested,
            unlock_status: session.unlock_status.clone(),
            answers: session
                .answers
                .iter()
                .map(|a| AnswerView {
                    question_id: a.question_id,
                    selected_answer: a.selected_answer.clone(),
                    text_answer: a.text_answer.clone(),
                    code_answer: a.code_answer.clone(),
                })
                .collect(),
        }
    }
}

/// Start (or resume) response
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session: SessionView,
    pub questions: Vec<QuestionView>,
    pub remaining_seconds: i64,
    pub resumed: bool,
}

/// Submission response; result fields stay null until the exam publishes
/// results
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: String,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub is_passed: Option<bool>,
}

impl SubmitResponse {
    pub fn new(session: &Session, exam: &Exam) -> Self {
        if exam.results_published {
            Self {
                status: session.status.clone(),
                score: Some(session.score),
                percentage: Some(session.percentage(exam.total_marks)),
                is_passed: Some(session.is_passed(exam.passing_marks)),
            }
        } else {
            Self {
                status: session.status.clone(),
                score: None,
                percentage: None,
                is_passed: None,
            }
        }
    }
}

/// Violation logging response
#[derive(Debug, Serialize)]
pub struct ViolationResponse {
    pub violation_count: i32,
    pub tab_switch_count: i32,
    pub fullscreen_exit_count: i32,
    pub action_taken: Option<String>,
}

/// Unlock request response
#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub session_id: Uuid,
    pub status: String,
    pub unlock_requested: bool,
    pub unlock_reason: Option<String>,
    pub unlock_requested_at: Option<DateTime<Utc>>,
    pub unlock_status: String,
}

impl From<&Session> for UnlockResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            status: session.status.clone(),
            unlock_requested: session.unlock_requested,
            unlock_reason: session.unlock_reason.clone(),
            unlock_requested_at: session.unlock_requested_at,
            unlock_status: session.unlock_status.clone(),
        }
    }
}
