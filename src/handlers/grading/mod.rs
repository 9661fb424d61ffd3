//! Grading and administrative session handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{Router, routing::post};

use crate::state::AppState;

/// Grading routes, nested under `/sessions`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{session_id}/answers/{question_id}/grade",
            post(handler::apply_grade),
        )
        .route(
            "/{session_id}/unlock-resolution",
            post(handler::resolve_unlock),
        )
}
