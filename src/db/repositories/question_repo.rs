//! Question repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::AppResult, models::AssignedQuestion};

/// Repository for question catalog reads
pub struct QuestionRepository;

impl QuestionRepository {
    /// Fetch an exam's assigned questions in authored order, with the
    /// per-exam marks override joined in
    pub async fn assigned_for_exam(
        pool: &PgPool,
        exam_id: &Uuid,
    ) -> AppResult<Vec<AssignedQuestion>> {
        let questions = sqlx::query_as::<_, AssignedQuestion>(
            r#"
            SELECT
                q.id, q.question_type, q.question_text, q.options,
                q.marks, q.negative_marks,
                eq.position, eq.marks AS marks_override
            FROM exam_questions eq
            JOIN questions q ON q.id = eq.question_id
            WHERE eq.exam_id = $1
            ORDER BY eq.position
            "#,
        )
        .bind(exam_id)
        .fetch_all(pool)
        .await?;

        Ok(questions)
    }
}
