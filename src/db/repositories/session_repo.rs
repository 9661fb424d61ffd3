//! Session repository
//!
//! All concurrency-critical storage primitives live here: the
//! create-if-absent insert keyed by the (student, exam) unique constraint,
//! targeted conditional updates for autosave and violation appends, and the
//! version-token compare-and-set used by submission and grading.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    constants::{session_status, unlock_status},
    error::AppResult,
    models::{Answer, Session, Violation},
};

/// Repository for session database operations
pub struct SessionRepository;

impl SessionRepository {
    /// Atomically create a session unless one already exists for the pair.
    ///
    /// Returns `None` when the unique constraint absorbed a duplicate or
    /// racing start; the caller re-reads the existing row. This is the only
    /// place sessions are created.
    pub async fn create_if_absent(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
        answers: &[Answer],
    ) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (student_id, exam_id, answers, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, exam_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(exam_id)
        .bind(Json(answers))
        .bind(session_status::IN_PROGRESS)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Find the session for a (student, exam) pair
    pub async fn find_by_pair(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
    ) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"SELECT * FROM sessions WHERE student_id = $1 AND exam_id = $2"#,
        )
        .bind(student_id)
        .bind(exam_id)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Find session by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(r#"SELECT * FROM sessions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(session)
    }

    /// Write-only autosave of one answer slot.
    ///
    /// A single conditional UPDATE: applies only when the session belongs to
    /// the caller, matches the exam, is in progress, and holds a slot for
    /// the question. Returns whether a row was touched.
    pub async fn save_answer(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
        question_id: &Uuid,
        patch: &serde_json::Value,
    ) -> AppResult<bool> {
        let probe = json!([{ "question_id": question_id }]);

        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET answers = (
                    SELECT COALESCE(
                        jsonb_agg(
                            CASE
                                WHEN t.elem->>'question_id' = $4 THEN t.elem || $5
                                ELSE t.elem
                            END
                            ORDER BY t.ord
                        ),
                        '[]'::jsonb
                    )
                    FROM jsonb_array_elements(sessions.answers)
                        WITH ORDINALITY AS t(elem, ord)
                ),
                version = version + 1,
                updated_at = NOW()
            WHERE student_id = $1
              AND exam_id = $2
              AND status = $3
              AND answers @> $6
            "#,
        )
        .bind(student_id)
        .bind(exam_id)
        .bind(session_status::IN_PROGRESS)
        .bind(question_id.to_string())
        .bind(patch)
        .bind(&probe)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Append a violation and bump the tab-switch counter in one atomic
    /// write, so concurrent bursts cannot lose updates. Guarded by the
    /// in-progress status; returns the updated row or `None`.
    pub async fn append_violation(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
        violation: &Violation,
        is_tab_switch: bool,
    ) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET violations = violations || $4,
                tab_switch_count = tab_switch_count + $5,
                version = version + 1,
                updated_at = NOW()
            WHERE student_id = $1 AND exam_id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(exam_id)
        .bind(session_status::IN_PROGRESS)
        .bind(json!(violation))
        .bind(if is_tab_switch { 1i32 } else { 0i32 })
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Compare-and-set write of submission-derived fields.
    ///
    /// Touches only the fields the submission owns: violations and the
    /// tab-switch counter stay whatever a concurrent append made them. A
    /// `None` return means the version token moved and the caller must
    /// re-read and retry.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_submission(
        pool: &PgPool,
        id: &Uuid,
        expected_version: i32,
        answers: &[Answer],
        score: f64,
        status: &str,
        submitted_at: DateTime<Utc>,
        total_time_minutes: i32,
        auto_submitted: bool,
        remarks: Option<&str>,
    ) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET answers = $3,
                score = $4,
                status = $5,
                submitted_at = $6,
                total_time_minutes = $7,
                auto_submitted = $8,
                remarks = COALESCE($9, remarks),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(Json(answers))
        .bind(score)
        .bind(status)
        .bind(submitted_at)
        .bind(total_time_minutes)
        .bind(auto_submitted)
        .bind(remarks)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Compare-and-set write of grading-derived fields (delegate callback)
    pub async fn apply_grades(
        pool: &PgPool,
        id: &Uuid,
        expected_version: i32,
        answers: &[Answer],
        score: f64,
        status: &str,
    ) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET answers = $3,
                score = $4,
                status = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(Json(answers))
        .bind(score)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Lock an in-progress session (proctoring action)
    pub async fn lock_in_progress(
        pool: &PgPool,
        id: &Uuid,
        remarks: &str,
    ) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET status = $2,
                remarks = $3,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(session_status::LOCKED)
        .bind(remarks)
        .bind(session_status::IN_PROGRESS)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Record an unlock request; applies only to locked sessions
    pub async fn request_unlock(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
        reason: &str,
        requested_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET unlock_requested = TRUE,
                unlock_reason = $3,
                unlock_requested_at = $4,
                unlock_status = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE student_id = $1 AND exam_id = $2 AND status = $6
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(exam_id)
        .bind(reason)
        .bind(requested_at)
        .bind(unlock_status::PENDING)
        .bind(session_status::LOCKED)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Resolve a pending unlock request (admin decision consumed as a plain
    /// status write): approval re-enters in-progress, rejection stays locked
    pub async fn resolve_unlock(
        pool: &PgPool,
        id: &Uuid,
        approve: bool,
    ) -> AppResult<Option<Session>> {
        let (new_status, new_unlock_status) = if approve {
            (session_status::IN_PROGRESS, unlock_status::APPROVED)
        } else {
            (session_status::LOCKED, unlock_status::REJECTED)
        };

        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET status = $2,
                unlock_status = $3,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND status = $4 AND unlock_status = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_status)
        .bind(new_unlock_status)
        .bind(session_status::LOCKED)
        .bind(unlock_status::PENDING)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }
}
