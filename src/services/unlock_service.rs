//! Unlock workflow
//!
//! Records a locked session's reinstatement request. Approval or rejection
//! is an administrative decision consumed here as a plain status write.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::repositories::SessionRepository,
    error::{AppError, AppResult},
    models::Session,
    utils::time::now_utc,
};

/// Unlock workflow service
pub struct UnlockService;

impl UnlockService {
    /// File an unlock request for the caller's locked session
    pub async fn request_unlock(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
        reason: &str,
    ) -> AppResult<Session> {
        let updated =
            SessionRepository::request_unlock(pool, student_id, exam_id, reason, now_utc())
                .await?;

        if let Some(session) = updated {
            tracing::info!(
                session_id = %session.id,
                exam_id = %exam_id,
                "Unlock requested"
            );
            return Ok(session);
        }

        match SessionRepository::find_by_pair(pool, student_id, exam_id).await? {
            None => Err(AppError::SessionNotActive(
                "no session exists for this exam".to_string(),
            )),
            Some(session) => Err(AppError::NotLocked(session.status)),
        }
    }

    /// Resolve a pending unlock request: approval re-enters in-progress,
    /// rejection leaves the session locked
    pub async fn resolve_unlock(
        pool: &PgPool,
        session_id: &Uuid,
        approve: bool,
    ) -> AppResult<Session> {
        let updated = SessionRepository::resolve_unlock(pool, session_id, approve).await?;

        if let Some(session) = updated {
            tracing::info!(
                session_id = %session.id,
                approve,
                status = %session.status,
                "Unlock request resolved"
            );
            return Ok(session);
        }

        match SessionRepository::find_by_id(pool, session_id).await? {
            None => Err(AppError::NotFound("Session not found".to_string())),
            Some(session) => Err(AppError::Validation(format!(
                "No pending unlock request (status: {}, unlock: {})",
                session.status, session.unlock_status
            ))),
        }
    }
}
