//! Exam repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    constants::{exam_status, session_status},
    error::AppResult,
    models::Exam,
};

/// Repository for exam database operations
pub struct ExamRepository;

impl ExamRepository {
    /// Find exam by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<Exam>> {
        let exam = sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(exam)
    }

    /// List exams visible to students (everything past draft)
    pub async fn list_visible(pool: &PgPool) -> AppResult<Vec<Exam>> {
        let exams = sqlx::query_as::<_, Exam>(
            r#"
            SELECT * FROM exams
            WHERE status <> $1
            ORDER BY start_time DESC
            "#,
        )
        .bind(exam_status::DRAFT)
        .fetch_all(pool)
        .await?;

        Ok(exams)
    }

    /// Persist a lazily reconciled status correction
    pub async fn persist_status(pool: &PgPool, id: &Uuid, status: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE exams
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Recompute attempt count and mean score from finalized sessions.
    ///
    /// Advisory statistics: callers treat failures as log-and-continue and
    /// concurrent submits may interleave recomputes in either order.
    pub async fn recompute_aggregates(pool: &PgPool, exam_id: &Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE exams e
            SET total_attempts = s.cnt,
                average_score = s.avg_score,
                updated_at = NOW()
            FROM (
                SELECT COUNT(*) AS cnt, COALESCE(AVG(score), 0) AS avg_score
                FROM sessions
                WHERE exam_id = $1 AND status NOT IN ($2, $3)
            ) s
            WHERE e.id = $1
            "#,
        )
        .bind(exam_id)
        .bind(session_status::IN_PROGRESS)
        .bind(session_status::LOCKED)
        .execute(pool)
        .await?;

        Ok(())
    }
}
