//! Proctoring monitor
//!
//! Records violations atomically, evaluates the exam's threshold policy,
//! and triggers the configured side-effecting transition (auto-submit or
//! lock) when a limit is breached.

use redis::aio::ConnectionManager;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    constants::{proctoring_actions, violation_types},
    db::repositories::{ExamRepository, QuestionRepository, SessionRepository},
    error::{AppError, AppResult},
    handlers::sessions::request::SubmittedAnswer,
    models::{Exam, Session, Violation},
    services::session_service::SessionService,
    utils::time::now_utc,
};

/// Which configured threshold a violation pushed past
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdBreach {
    TabSwitches,
    FullscreenExits,
}

impl ThresholdBreach {
    fn describe(&self) -> &'static str {
        match self {
            Self::TabSwitches => "tab switch limit reached",
            Self::FullscreenExits => "fullscreen exit limit reached",
        }
    }
}

/// Running counts and the action taken, for client display
#[derive(Debug)]
pub struct ViolationOutcome {
    pub violation_count: i32,
    pub tab_switch_count: i32,
    pub fullscreen_exit_count: i32,
    pub action_taken: Option<&'static str>,
}

/// Proctoring monitor service
pub struct ProctoringService;

impl ProctoringService {
    /// Record a violation and enforce the exam's threshold policy
    pub async fn log_violation(
        pool: &PgPool,
        redis: ConnectionManager,
        student_id: &Uuid,
        exam_id: &Uuid,
        violation_type: &str,
        description: Option<&str>,
    ) -> AppResult<ViolationOutcome> {
        if !violation_types::KNOWN.contains(&violation_type) {
            return Err(AppError::Validation(format!(
                "Unknown violation type: {}",
                violation_type
            )));
        }

        let violation = Violation {
            violation_type: violation_type.to_string(),
            timestamp: now_utc(),
            description: description.map(|d| d.to_string()),
        };
        let is_tab_switch = violation.is_tab_switch();

        // Append and counter bump are one atomic write; rapid bursts of
        // near-simultaneous events cannot lose updates.
        let Some(session) = SessionRepository::append_violation(
            pool, student_id, exam_id, &violation, is_tab_switch,
        )
        .await?
        else {
            return Err(SessionService::session_not_active(pool, student_id, exam_id, false).await?);
        };

        tracing::info!(
            session_id = %session.id,
            exam_id = %exam_id,
            violation_type,
            tab_switch_count = session.tab_switch_count,
            "Violation recorded"
        );

        let exam = ExamRepository::find_by_id(pool, exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

        let violation_count = session.violations.len() as i32;
        let tab_switch_count = session.tab_switch_count;
        let fullscreen_exit_count = session.fullscreen_exit_count();

        let Some(breach) = threshold_breach(&exam, tab_switch_count, fullscreen_exit_count) else {
            return Ok(ViolationOutcome {
                violation_count,
                tab_switch_count,
                fullscreen_exit_count,
                action_taken: None,
            });
        };

        let action_taken =
            Self::enforce(pool, redis, &exam, session, breach).await?;

        Ok(ViolationOutcome {
            violation_count,
            tab_switch_count,
            fullscreen_exit_count,
            action_taken,
        })
    }

    /// Apply the configured action for a breached threshold
    async fn enforce(
        pool: &PgPool,
        redis: ConnectionManager,
        exam: &Exam,
        session: Session,
        breach: ThresholdBreach,
    ) -> AppResult<Option<&'static str>> {
        match exam.action_on_limit.as_str() {
            proctoring_actions::AUTO_SUBMIT => {
                let remarks = format!("Auto-submitted: {}", breach.describe());
                let questions = QuestionRepository::assigned_for_exam(pool, &exam.id).await?;
                // Submit whatever the student autosaved so far.
                let submitted: Vec<SubmittedAnswer> = Vec::new();
                match SessionService::finalize(
                    pool,
                    redis,
                    exam,
                    &questions,
                    session,
                    &submitted,
                    true,
                    Some(&remarks),
                )
                .await
                {
                    Ok(_) => Ok(Some(proctoring_actions::AUTO_SUBMIT)),
                    // A racing submit already finalized the session; the
                    // violation itself is recorded either way.
                    Err(AppError::AlreadySubmitted) => {
                        tracing::debug!(exam_id = %exam.id, "Auto-submit lost to a concurrent finalizer");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
            proctoring_actions::LOCK => {
                let remarks = format!("Locked: {}", breach.describe());
                match SessionRepository::lock_in_progress(pool, &session.id, &remarks).await? {
                    Some(locked) => {
                        tracing::info!(session_id = %locked.id, "Session locked by proctoring policy");
                        Ok(Some(proctoring_actions::LOCK))
                    }
                    None => {
                        tracing::debug!(session_id = %session.id, "Lock skipped, session no longer in progress");
                        Ok(None)
                    }
                }
            }
            // Warn policy records the violation and counts but never
            // transitions state.
            _ => Ok(Some(proctoring_actions::WARN)),
        }
    }
}

/// Evaluate the threshold policy against the running counts.
///
/// A configured maximum of 0 means trigger-on-first (effective floor of 1),
/// not unlimited; the asymmetry matches how exams are authored upstream.
pub fn threshold_breach(
    exam: &Exam,
    tab_switch_count: i32,
    fullscreen_exit_count: i32,
) -> Option<ThresholdBreach> {
    if !exam.proctoring_enabled {
        return None;
    }

    if tab_switch_count >= exam.max_tab_switches.max(1) {
        return Some(ThresholdBreach::TabSwitches);
    }
    if fullscreen_exit_count >= exam.max_fullscreen_exits.max(1) {
        return Some(ThresholdBreach::FullscreenExits);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn exam(enabled: bool, max_tabs: i32, max_fullscreen: i32) -> Exam {
        let now = Utc::now();
        Exam {
            id: Uuid::new_v4(),
            title: "Quiz".to_string(),
            description: None,
            start_time: now - Duration::minutes(10),
            end_time: now + Duration::minutes(50),
            duration_minutes: 60,
            total_marks: 10.0,
            passing_marks: 4.0,
            randomize_questions: false,
            negative_marking: false,
            negative_marks: 0.0,
            results_published: false,
            status: "ongoing".to_string(),
            proctoring_enabled: enabled,
            max_tab_switches: max_tabs,
            max_fullscreen_exits: max_fullscreen,
            action_on_limit: "auto_submit".to_string(),
            total_attempts: 0,
            average_score: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_zero_max_triggers_on_first_violation() {
        let e = exam(true, 0, 0);
        assert_eq!(threshold_breach(&e, 1, 0), Some(ThresholdBreach::TabSwitches));
        assert_eq!(
            threshold_breach(&e, 0, 1),
            Some(ThresholdBreach::FullscreenExits)
        );
        assert_eq!(threshold_breach(&e, 0, 0), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let e = exam(true, 3, 2);
        assert_eq!(threshold_breach(&e, 2, 0), None);
        assert_eq!(threshold_breach(&e, 3, 0), Some(ThresholdBreach::TabSwitches));
        assert_eq!(threshold_breach(&e, 4, 0), Some(ThresholdBreach::TabSwitches));
        assert_eq!(
            threshold_breach(&e, 0, 2),
            Some(ThresholdBreach::FullscreenExits)
        );
    }

    #[test]
    fn test_disabled_proctoring_never_breaches() {
        let e = exam(false, 0, 0);
        assert_eq!(threshold_breach(&e, 100, 100), None);
    }

    #[test]
    fn test_tab_switches_checked_before_fullscreen() {
        let e = exam(true, 1, 1);
        assert_eq!(threshold_breach(&e, 1, 1), Some(ThresholdBreach::TabSwitches));
    }
}
