//! Grading request DTOs

use serde::Deserialize;
use validator::Validate;

/// Record a manual grade for one answer
#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    /// Marks awarded by the evaluator; may be negative under negative
    /// marking schemes
    #[validate(range(min = -1000.0, max = 1000.0))]
    pub marks_awarded: f64,

    #[validate(length(max = 4096))]
    pub feedback: Option<String>,
}

/// Resolve a pending unlock request
#[derive(Debug, Deserialize)]
pub struct UnlockResolutionRequest {
    pub approve: bool,
}
