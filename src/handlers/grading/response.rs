//! Grading response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Session;

/// Evaluator view of a session after a grading or unlock write
#[derive(Debug, Serialize)]
pub struct GradedSessionResponse {
    pub session_id: Uuid,
    pub status: String,
    pub score: f64,
    pub pending_answers: usize,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<&Session> for GradedSessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            status: session.status.clone(),
            score: session.score,
            pending_answers: session
                .answers
                .iter()
                .filter(|a| !a.is_evaluated)
                .count(),
            submitted_at: session.submitted_at,
        }
    }
}
