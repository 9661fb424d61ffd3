//! Grading handler implementations

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    middleware::auth::{AdminUser, EvaluatorUser},
    services::{SessionService, UnlockService},
    state::AppState,
};

use super::{
    request::{GradeRequest, UnlockResolutionRequest},
    response::GradedSessionResponse,
};

/// Evaluation-delegate callback: record a manual grade for one answer
pub async fn apply_grade(
    State(state): State<AppState>,
    EvaluatorUser(evaluator): EvaluatorUser,
    Path((session_id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<GradeRequest>,
) -> AppResult<Json<GradedSessionResponse>> {
    payload.validate()?;

    let session = SessionService::apply_manual_grade(
        state.db(),
        &session_id,
        &question_id,
        payload.marks_awarded,
        payload.feedback.as_deref(),
        &evaluator.id,
    )
    .await?;

    Ok(Json(GradedSessionResponse::from(&session)))
}

/// Resolve a pending unlock request (admin decision)
pub async fn resolve_unlock(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<UnlockResolutionRequest>,
) -> AppResult<Json<GradedSessionResponse>> {
    let session =
        UnlockService::resolve_unlock(state.db(), &session_id, payload.approve).await?;

    Ok(Json(GradedSessionResponse::from(&session)))
}
