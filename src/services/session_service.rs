//! Session engine
//!
//! Creates, advances, and finalizes one attempt per (student, exam) pair.
//! Creation rides on the storage unique constraint; finalization runs a
//! bounded optimistic-concurrency loop against the row's version token.

use rand::seq::SliceRandom;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    constants::{EVALUATION_QUEUE_KEY, SUBMIT_MAX_RETRIES, session_status},
    db::repositories::{ExamRepository, QuestionRepository, SessionRepository},
    error::{AppError, AppResult},
    handlers::sessions::request::{SaveAnswerRequest, SubmittedAnswer},
    models::{Answer, AssignedQuestion, Exam, ExamStatus, Session, SessionStatus},
    services::evaluation,
    utils::time::{elapsed_minutes_rounded, now_utc},
};

/// Result of a start call: the (possibly pre-existing) session plus the
/// question list in the session's fixed order
pub struct StartOutcome {
    pub session: Session,
    pub questions: Vec<AssignedQuestion>,
    pub remaining_seconds: i64,
    pub resumed: bool,
}

/// Session engine service
pub struct SessionService;

impl SessionService {
    /// Start (or idempotently resume) the caller's attempt at an exam
    pub async fn start_session(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
    ) -> AppResult<StartOutcome> {
        let exam = ExamRepository::find_by_id(pool, exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

        let now = now_utc();
        match exam.reconciled_status(now) {
            ExamStatus::Draft | ExamStatus::Cancelled => {
                return Err(AppError::NotFound("Exam not available".to_string()));
            }
            ExamStatus::Scheduled => {
                return Err(AppError::OutOfWindow {
                    reason: "exam opens",
                    boundary: exam.start_time,
                });
            }
            ExamStatus::Completed => {
                return Err(AppError::OutOfWindow {
                    reason: "exam closed",
                    boundary: exam.end_time,
                });
            }
            ExamStatus::Ongoing => {
                // The window is half-open; reconciliation treats the end
                // instant as ongoing but starts are rejected there.
                if !exam.is_window_open(now) {
                    return Err(AppError::OutOfWindow {
                        reason: "exam closed",
                        boundary: exam.end_time,
                    });
                }
            }
        }

        let questions = QuestionRepository::assigned_for_exam(pool, exam_id).await?;
        if questions.is_empty() {
            return Err(AppError::Validation("Exam has no questions".to_string()));
        }

        let answers = build_answer_skeleton(&questions, exam.randomize_questions);

        if let Some(session) =
            SessionRepository::create_if_absent(pool, student_id, exam_id, &answers).await?
        {
            tracing::info!(
                student_id = %student_id,
                exam_id = %exam_id,
                session_id = %session.id,
                "Session started"
            );
            let remaining = session.remaining_seconds(exam.duration_minutes, now);
            let ordered = order_questions(questions, &session.answers);
            return Ok(StartOutcome {
                session,
                questions: ordered,
                remaining_seconds: remaining,
                resumed: false,
            });
        }

        // Expected outcome of a duplicate or racing start request; the
        // unique constraint absorbed the insert.
        tracing::debug!(
            student_id = %student_id,
            exam_id = %exam_id,
            "Duplicate start request, returning existing session"
        );

        let session = SessionRepository::find_by_pair(pool, student_id, exam_id)
            .await?
            .ok_or_else(|| {
                AppError::Database("Session missing after duplicate start".to_string())
            })?;

        match SessionStatus::from_str(&session.status) {
            Some(SessionStatus::InProgress) => {
                let remaining = session.remaining_seconds(exam.duration_minutes, now);
                let ordered = order_questions(questions, &session.answers);
                Ok(StartOutcome {
                    session,
                    questions: ordered,
                    remaining_seconds: remaining,
                    resumed: true,
                })
            }
            _ => Err(AppError::AlreadySubmitted),
        }
    }

    /// Write-only autosave of one answer; never evaluates or touches score
    pub async fn save_answer(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
        payload: SaveAnswerRequest,
    ) -> AppResult<()> {
        let mut patch = serde_json::Map::new();
        if let Some(selected) = &payload.selected_answer {
            patch.insert("selected_answer".to_string(), json!(selected));
        }
        if let Some(text) = &payload.text_answer {
            patch.insert("text_answer".to_string(), json!(text));
        }
        if let Some(code) = &payload.code_answer {
            patch.insert("code_answer".to_string(), json!(code));
        }
        if patch.is_empty() {
            return Err(AppError::Validation("No answer payload given".to_string()));
        }

        let applied = SessionRepository::save_answer(
            pool,
            student_id,
            exam_id,
            &payload.question_id,
            &serde_json::Value::Object(patch),
        )
        .await?;

        if !applied {
            return Err(Self::session_not_active(pool, student_id, exam_id, true).await?);
        }

        Ok(())
    }

    /// Submit the caller's in-progress session
    pub async fn submit_session(
        pool: &PgPool,
        redis: ConnectionManager,
        student_id: &Uuid,
        exam_id: &Uuid,
        answers: Vec<SubmittedAnswer>,
        auto_submitted: bool,
    ) -> AppResult<(Session, Exam)> {
        let session = SessionRepository::find_by_pair(pool, student_id, exam_id)
            .await?
            .ok_or(AppError::NothingToSubmit)?;

        if SessionStatus::from_str(&session.status) != Some(SessionStatus::InProgress) {
            return Err(AppError::NothingToSubmit);
        }

        let exam = ExamRepository::find_by_id(pool, exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;
        let questions = QuestionRepository::assigned_for_exam(pool, exam_id).await?;

        let submitted =
            Self::finalize(pool, redis, &exam, &questions, session, &answers, auto_submitted, None)
                .await?;

        Ok((submitted, exam))
    }

    /// Evaluate and persist a submission with bounded optimistic retries.
    ///
    /// The CAS update writes only submission-derived fields, so a violation
    /// appended between our read and write survives; on a version miss we
    /// re-read and re-derive everything from the latest row.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn finalize(
        pool: &PgPool,
        mut redis: ConnectionManager,
        exam: &Exam,
        questions: &[AssignedQuestion],
        mut session: Session,
        answers: &[SubmittedAnswer],
        auto_submitted: bool,
        remarks: Option<&str>,
    ) -> AppResult<Session> {
        for attempt in 1..=SUBMIT_MAX_RETRIES {
            let now = now_utc();
            let evaluated =
                evaluation::evaluate_submission(exam, questions, &session.answers, answers);
            let status = if evaluated.has_pending {
                session_status::PENDING_EVALUATION
            } else {
                session_status::SUBMITTED
            };
            let total_time = elapsed_minutes_rounded(session.started_at, now);

            let updated = SessionRepository::apply_submission(
                pool,
                &session.id,
                session.version,
                &evaluated.answers,
                evaluated.score,
                status,
                now,
                total_time,
                auto_submitted,
                remarks,
            )
            .await?;

            if let Some(updated) = updated {
                tracing::info!(
                    session_id = %updated.id,
                    exam_id = %exam.id,
                    status = %updated.status,
                    score = updated.score,
                    auto_submitted,
                    "Session finalized"
                );

                // Advisory statistics; a failure must not fail the submit.
                if let Err(e) = ExamRepository::recompute_aggregates(pool, &exam.id).await {
                    tracing::warn!(exam_id = %exam.id, error = %e, "Aggregate recompute failed");
                }

                if status == session_status::PENDING_EVALUATION {
                    // The submission is already committed; the delegate also
                    // reconciles from a pending_evaluation scan, so a queue
                    // failure only delays grading.
                    if let Err(e) = redis
                        .lpush::<_, _, ()>(EVALUATION_QUEUE_KEY, updated.id.to_string())
                        .await
                    {
                        tracing::warn!(
                            session_id = %updated.id,
                            error = %e,
                            "Failed to enqueue session for evaluation"
                        );
                    }
                }

                return Ok(updated);
            }

            // Version moved underneath us (typically a violation append);
            // expected, recover by re-reading.
            tracing::debug!(
                session_id = %session.id,
                attempt,
                "Submission hit a concurrent write, retrying"
            );

            let latest = SessionRepository::find_by_id(pool, &session.id)
                .await?
                .ok_or_else(|| AppError::Database("Session vanished during submit".to_string()))?;

            session = recheck_after_miss(latest)?;
        }

        Err(AppError::ConcurrentUpdateConflict {
            attempts: SUBMIT_MAX_RETRIES,
        })
    }

    /// Evaluation-delegate callback: record a manual grade for one answer
    /// and recompute the aggregate score, transitioning to evaluated once
    /// every answer is graded
    pub async fn apply_manual_grade(
        pool: &PgPool,
        session_id: &Uuid,
        question_id: &Uuid,
        marks_awarded: f64,
        feedback: Option<&str>,
        evaluator_id: &Uuid,
    ) -> AppResult<Session> {
        for _attempt in 1..=SUBMIT_MAX_RETRIES {
            let session = SessionRepository::find_by_id(pool, session_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

            if SessionStatus::from_str(&session.status) != Some(SessionStatus::PendingEvaluation) {
                return Err(AppError::Validation(format!(
                    "Session is not awaiting evaluation (status: {})",
                    session.status
                )));
            }

            let mut answers = session.answers.0.clone();
            match evaluation::apply_grade(
                &mut answers,
                question_id,
                marks_awarded,
                feedback,
                evaluator_id,
                now_utc(),
            ) {
                evaluation::GradeOutcome::Applied => {}
                evaluation::GradeOutcome::AlreadyEvaluated => {
                    return Err(AppError::Validation(
                        "Answer has already been evaluated".to_string(),
                    ));
                }
                evaluation::GradeOutcome::NoSuchAnswer => {
                    return Err(AppError::NotFound(
                        "Session has no answer for that question".to_string(),
                    ));
                }
            }

            let score: f64 = answers.iter().map(|a| a.marks_awarded).sum();
            let status = if answers.iter().all(|a| a.is_evaluated) {
                session_status::EVALUATED
            } else {
                session_status::PENDING_EVALUATION
            };

            if let Some(updated) = SessionRepository::apply_grades(
                pool,
                session_id,
                session.version,
                &answers,
                score,
                status,
            )
            .await?
            {
                tracing::info!(
                    session_id = %updated.id,
                    question_id = %question_id,
                    evaluator_id = %evaluator_id,
                    status = %updated.status,
                    "Manual grade applied"
                );
                return Ok(updated);
            }

            tracing::debug!(session_id = %session_id, "Grading hit a concurrent write, retrying");
        }

        Err(AppError::ConcurrentUpdateConflict {
            attempts: SUBMIT_MAX_RETRIES,
        })
    }

    /// Build the SessionNotActive error with a message naming what failed
    pub(crate) async fn session_not_active(
        pool: &PgPool,
        student_id: &Uuid,
        exam_id: &Uuid,
        question_scoped: bool,
    ) -> AppResult<AppError> {
        let message = match SessionRepository::find_by_pair(pool, student_id, exam_id).await? {
            None => "no session exists for this exam".to_string(),
            Some(s) if SessionStatus::from_str(&s.status).is_some_and(|st| st.is_terminal()) => {
                format!("session is {}", s.status)
            }
            Some(_) if question_scoped => "question is not part of this session".to_string(),
            Some(s) => format!("session is {}", s.status),
        };
        Ok(AppError::SessionNotActive(message))
    }
}

/// One empty answer slot per assigned question, shuffled per student with
/// an unbiased Fisher-Yates permutation when the exam asks for it
fn build_answer_skeleton(questions: &[AssignedQuestion], randomize: bool) -> Vec<Answer> {
    let mut ids: Vec<Uuid> = questions.iter().map(|q| q.question.id).collect();
    if randomize {
        ids.shuffle(&mut rand::rng());
    }
    ids.into_iter().map(Answer::skeleton).collect()
}

/// Decide whether a submission can retry after a version miss.
///
/// The re-read row carries everything a concurrent writer added (appended
/// violations, bumped counters); retrying against it re-derives the
/// submission without losing those writes. A terminal status means another
/// finalizer (proctoring auto-submit or a racing client) already won.
fn recheck_after_miss(latest: Session) -> AppResult<Session> {
    if SessionStatus::from_str(&latest.status).is_some_and(|s| s.is_terminal()) {
        return Err(AppError::AlreadySubmitted);
    }
    Ok(latest)
}

/// Reorder the question list to match the session's fixed answer order
fn order_questions(
    questions: Vec<AssignedQuestion>,
    answers: &[Answer],
) -> Vec<AssignedQuestion> {
    let mut by_id: std::collections::HashMap<Uuid, AssignedQuestion> = questions
        .into_iter()
        .map(|q| (q.question.id, q))
        .collect();
    answers
        .iter()
        .filter_map(|a| by_id.remove(&a.question_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionOption, Violation};
    use sqlx::types::Json;

    fn assigned(position: i32) -> AssignedQuestion {
        AssignedQuestion {
            question: Question {
                id: Uuid::new_v4(),
                question_type: "mcq".to_string(),
                question_text: format!("q{}", position),
                options: Json(vec![QuestionOption {
                    text: "a".to_string(),
                    is_correct: true,
                }]),
                marks: 1.0,
                negative_marks: 0.0,
            },
            position,
            marks_override: None,
        }
    }

    #[test]
    fn test_skeleton_keeps_authored_order_without_randomization() {
        let questions: Vec<_> = (0..5).map(assigned).collect();
        let answers = build_answer_skeleton(&questions, false);
        let expected: Vec<Uuid> = questions.iter().map(|q| q.question.id).collect();
        let got: Vec<Uuid> = answers.iter().map(|a| a.question_id).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_shuffled_skeleton_is_a_permutation() {
        let questions: Vec<_> = (0..20).map(assigned).collect();
        let answers = build_answer_skeleton(&questions, true);

        let mut expected: Vec<Uuid> = questions.iter().map(|q| q.question.id).collect();
        let mut got: Vec<Uuid> = answers.iter().map(|a| a.question_id).collect();
        expected.sort();
        got.sort();
        assert_eq!(got, expected);
    }

    fn session_at(status: &str, version: i32, violations: Vec<Violation>) -> Session {
        let now = now_utc();
        let tab_switch_count = violations.iter().filter(|v| v.is_tab_switch()).count() as i32;
        Session {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            answers: Json(Vec::new()),
            score: 0.0,
            status: status.to_string(),
            started_at: now,
            submitted_at: None,
            total_time_minutes: None,
            auto_submitted: false,
            remarks: None,
            violations: Json(violations),
            tab_switch_count,
            unlock_requested: false,
            unlock_reason: None,
            unlock_requested_at: None,
            unlock_status: "none".to_string(),
            version,
            updated_at: now,
        }
    }

    #[test]
    fn test_retry_carries_concurrent_violations_forward() {
        let latest = session_at(
            "in_progress",
            3,
            vec![Violation {
                violation_type: "tab_switch".to_string(),
                timestamp: now_utc(),
                description: None,
            }],
        );

        let next = recheck_after_miss(latest).unwrap();
        assert_eq!(next.version, 3);
        assert_eq!(next.violations.len(), 1);
        assert_eq!(next.tab_switch_count, 1);
    }

    #[test]
    fn test_retry_stops_when_another_finalizer_won() {
        for status in ["submitted", "pending_evaluation", "evaluated", "locked"] {
            let latest = session_at(status, 2, Vec::new());
            assert!(matches!(
                recheck_after_miss(latest),
                Err(AppError::AlreadySubmitted)
            ));
        }
    }

    #[test]
    fn test_questions_reordered_to_session_order() {
        let questions: Vec<_> = (0..4).map(assigned).collect();
        let mut shuffled: Vec<Uuid> = questions.iter().map(|q| q.question.id).collect();
        shuffled.reverse();
        let answers: Vec<Answer> = shuffled.iter().copied().map(Answer::skeleton).collect();

        let ordered = order_questions(questions, &answers);
        let got: Vec<Uuid> = ordered.iter().map(|q| q.question.id).collect();
        assert_eq!(got, shuffled);
    }
}
