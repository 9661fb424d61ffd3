//! Exam read surface
//!
//! Read paths apply the status reconciler lazily: the stored status is a
//! cached projection of the time window, corrected whenever an exam is
//! read. There is no background scheduler; staleness is bounded by read
//! frequency.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::repositories::ExamRepository,
    error::{AppError, AppResult},
    models::Exam,
    utils::time::now_utc,
};

/// Exam read service
pub struct ExamService;

impl ExamService {
    /// Fetch an exam, lazily correcting its cached status
    pub async fn get_exam(pool: &PgPool, id: &Uuid) -> AppResult<Exam> {
        let mut exam = ExamRepository::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

        Self::reconcile(pool, &mut exam).await;
        Ok(exam)
    }

    /// List student-visible exams, lazily correcting cached statuses
    pub async fn list_exams(pool: &PgPool) -> AppResult<Vec<Exam>> {
        let mut exams = ExamRepository::list_visible(pool).await?;
        for exam in &mut exams {
            Self::reconcile(pool, exam).await;
        }
        Ok(exams)
    }

    /// Persist a status correction when the stored value lags the clock.
    /// The write is best-effort; a reconciled value is still returned.
    async fn reconcile(pool: &PgPool, exam: &mut Exam) {
        let correct = exam.reconciled_status(now_utc());
        if correct.as_str() != exam.status {
            if let Err(e) = ExamRepository::persist_status(pool, &exam.id, correct.as_str()).await
            {
                tracing::warn!(exam_id = %exam.id, error = %e, "Failed to persist status correction");
            }
            exam.status = correct.as_str().to_string();
        }
    }
}
