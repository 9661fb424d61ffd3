//! Session request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Autosave one answer
#[derive(Debug, Deserialize, Validate)]
pub struct SaveAnswerRequest {
    /// Question the answer belongs to
    pub question_id: Uuid,

    #[validate(length(max = 1024))]
    pub selected_answer: Option<String>,

    #[validate(length(max = 65536))]
    pub text_answer: Option<String>,

    #[validate(length(max = 262144))]
    pub code_answer: Option<String>,
}

/// One answer inside a submission
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_answer: Option<String>,
    pub text_answer: Option<String>,
    pub code_answer: Option<String>,
}

/// Submit the session
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,

    /// Set by clients whose local timer expired
    #[serde(default)]
    pub auto_submitted: bool,
}

/// Report a proctoring violation
#[derive(Debug, Deserialize, Validate)]
pub struct ViolationRequest {
    #[validate(length(min = 1, max = 64))]
    pub violation_type: String,

    #[validate(length(max = 1024))]
    pub description: Option<String>,
}

/// Request reinstatement of a locked session
#[derive(Debug, Deserialize, Validate)]
pub struct UnlockRequest {
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}
