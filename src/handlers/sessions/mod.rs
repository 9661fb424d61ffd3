//! Session handlers (student-facing attempt lifecycle)

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Session routes, nested under `/exams/{exam_id}/session`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::get_session))
        .route("/start", post(handler::start_session))
        .route("/answer", put(handler::save_answer))
        .route("/submit", post(handler::submit_session))
        .route("/violation", post(handler::log_violation))
        .route("/unlock", post(handler::request_unlock))
}
