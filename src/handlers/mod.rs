//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod exams;
pub mod grading;
pub mod health;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/exams", exams::routes())
        .nest("/exams/{exam_id}/session", sessions::routes())
        .nest("/sessions", grading::routes())
}
