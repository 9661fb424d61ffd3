//! Exam response DTOs
//!
//! Student-facing views: question options are stripped of correct-answer
//! flags before they leave the core.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AssignedQuestion, Exam};

/// Proctoring policy view
#[derive(Debug, Serialize)]
pub struct ProctoringPolicyView {
    pub enabled: bool,
    pub max_tab_switches: i32,
    pub max_fullscreen_exits: i32,
    pub action_on_limit: String,
}

/// Exam response
#[derive(Debug, Serialize)]
pub struct ExamResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub total_marks: f64,
    pub passing_marks: f64,
    pub status: String,
    pub results_published: bool,
    pub proctoring: ProctoringPolicyView,
}

impl From<&Exam> for ExamResponse {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            start_time: exam.start_time,
            end_time: exam.end_time,
            duration_minutes: exam.duration_minutes,
            total_marks: exam.total_marks,
            passing_marks: exam.passing_marks,
            status: exam.status.clone(),
            results_published: exam.results_published,
            proctoring: ProctoringPolicyView {
                enabled: exam.proctoring_enabled,
                max_tab_switches: exam.max_tab_switches,
                max_fullscreen_exits: exam.max_fullscreen_exits,
                action_on_limit: exam.action_on_limit.clone(),
            },
        }
    }
}

/// Exam list response
#[derive(Debug, Serialize)]
pub struct ExamsListResponse {
    pub exams: Vec<ExamResponse>,
    pub total: usize,
}

/// Sanitized question view (no correct-answer flags)
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub question_type: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub marks: f64,
}

impl From<&AssignedQuestion> for QuestionView {
    fn from(assigned: &AssignedQuestion) -> Self {
        Self {
            id: assigned.question.id,
            question_type: assigned.question.question_type.clone(),
            question_text: assigned.question.question_text.clone(),
            options: assigned
                .question
                .options
                .iter()
                .map(|o| o.text.clone())
                .collect(),
            marks: assigned.effective_marks(),
        }
    }
}
