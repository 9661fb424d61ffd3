//! Session handler implementations

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::repositories::SessionRepository,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    services::{ProctoringService, SessionService, UnlockService},
    state::AppState,
};

use super::{
    request::{SaveAnswerRequest, SubmitRequest, UnlockRequest, ViolationRequest},
    response::{
        SessionView, StartSessionResponse, SubmitResponse, UnlockResponse, ViolationResponse,
    },
};

/// Get the caller's session for this exam
pub async fn get_session(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(exam_id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let session = SessionRepository::find_by_pair(state.db(), &auth_user.id, &exam_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No session for this exam".to_string()))?;

    Ok(Json(SessionView::from(&session)))
}

/// Start (or idempotently resume) a session
pub async fn start_session(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(exam_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<StartSessionResponse>)> {
    let outcome = SessionService::start_session(state.db(), &auth_user.id, &exam_id).await?;

    let status = if outcome.resumed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(StartSessionResponse {
            session: SessionView::from(&outcome.session),
            questions: outcome.questions.iter().map(Into::into).collect(),
            remaining_seconds: outcome.remaining_seconds,
            resumed: outcome.resumed,
        }),
    ))
}

/// Autosave one answer
pub async fn save_answer(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<SaveAnswerRequest>,
) -> AppResult<StatusCode> {
    payload.validate()?;

    SessionService::save_answer(state.db(), &auth_user.id, &exam_id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit the session
pub async fn submit_session(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<SubmitRequest>,
) -> AppResult<Json<SubmitResponse>> {
    let (session, exam) = SessionService::submit_session(
        state.db(),
        state.redis(),
        &auth_user.id,
        &exam_id,
        payload.answers,
        payload.auto_submitted,
    )
    .await?;

    Ok(Json(SubmitResponse::new(&session, &exam)))
}

/// Report a proctoring violation
pub async fn log_violation(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<ViolationRequest>,
) -> AppResult<Json<ViolationResponse>> {
    payload.validate()?;

    let outcome = ProctoringService::log_violation(
        state.db(),
        state.redis(),
        &auth_user.id,
        &exam_id,
        &payload.violation_type,
        payload.description.as_deref(),
    )
    .await?;

    Ok(Json(ViolationResponse {
        violation_count: outcome.violation_count,
        tab_switch_count: outcome.tab_switch_count,
        fullscreen_exit_count: outcome.fullscreen_exit_count,
        action_taken: outcome.action_taken.map(|a| a.to_string()),
    }))
}

/// Request reinstatement of a locked session
pub async fn request_unlock(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<UnlockRequest>,
) -> AppResult<Json<UnlockResponse>> {
    payload.validate()?;

    let session =
        UnlockService::request_unlock(state.db(), &auth_user.id, &exam_id, &payload.reason)
            .await?;

    Ok(Json(UnlockResponse::from(&session)))
}
