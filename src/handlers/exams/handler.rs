//! Exam handler implementations

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::auth::AuthenticatedUser,
    services::ExamService,
    state::AppState,
};

use super::response::{ExamResponse, ExamsListResponse};

/// List student-visible exams (statuses reconciled lazily)
pub async fn list_exams(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
) -> AppResult<Json<ExamsListResponse>> {
    let exams = ExamService::list_exams(state.db()).await?;
    let responses: Vec<ExamResponse> = exams.iter().map(ExamResponse::from).collect();

    Ok(Json(ExamsListResponse {
        total: responses.len(),
        exams: responses,
    }))
}

/// Get a specific exam
pub async fn get_exam(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Path(exam_id): Path<Uuid>,
) -> AppResult<Json<ExamResponse>> {
    let exam = ExamService::get_exam(state.db(), &exam_id).await?;
    Ok(Json(ExamResponse::from(&exam)))
}
