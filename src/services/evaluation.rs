//! Answer evaluation rules
//!
//! Pure scoring logic, kept free of storage so the session engine can
//! recompute it against whatever row version it is retrying on.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    handlers::sessions::request::SubmittedAnswer,
    models::{Answer, AssignedQuestion, Exam, QuestionType},
};

/// Result of evaluating a full submission
#[derive(Debug)]
pub struct EvaluatedSubmission {
    /// Same order and membership as the session's answer list
    pub answers: Vec<Answer>,
    /// Sum of awarded marks; may be negative under negative marking
    pub score: f64,
    /// At least one answer needs the external grading delegate
    pub has_pending: bool,
}

/// Evaluate a submission against the session's fixed answer slots.
///
/// Submitted payloads are merged onto their slots by question id (unknown
/// ids are ignored), then every slot is scored. Objective slots with no
/// selection count as incorrect. Non-objective slots are only held for the
/// grading delegate when the student actually wrote something.
pub fn evaluate_submission(
    exam: &Exam,
    questions: &[AssignedQuestion],
    base_answers: &[Answer],
    submitted: &[SubmittedAnswer],
) -> EvaluatedSubmission {
    let by_id: HashMap<Uuid, &AssignedQuestion> =
        questions.iter().map(|q| (q.question.id, q)).collect();
    let payloads: HashMap<Uuid, &SubmittedAnswer> =
        submitted.iter().map(|s| (s.question_id, s)).collect();

    let mut answers: Vec<Answer> = base_answers.to_vec();
    let mut score = 0.0;
    let mut has_pending = false;

    for slot in &mut answers {
        if let Some(payload) = payloads.get(&slot.question_id) {
            if payload.selected_answer.is_some() {
                slot.selected_answer = payload.selected_answer.clone();
            }
            if payload.text_answer.is_some() {
                slot.text_answer = payload.text_answer.clone();
            }
            if payload.code_answer.is_some() {
                slot.code_answer = payload.code_answer.clone();
            }
        }

        let Some(assigned) = by_id.get(&slot.question_id) else {
            // Slot for a question no longer assigned; leave it untouched.
            score += slot.marks_awarded;
            continue;
        };

        evaluate_slot(exam, assigned, slot);
        score += slot.marks_awarded;
        has_pending |= !slot.is_evaluated;
    }

    EvaluatedSubmission {
        answers,
        score,
        has_pending,
    }
}

/// Score a single answer slot in place
fn evaluate_slot(exam: &Exam, assigned: &AssignedQuestion, slot: &mut Answer) {
    let question = &assigned.question;
    let question_type = QuestionType::from_str(&question.question_type);

    match question_type {
        Some(t) if t.is_objective() => {
            let correct = match (slot.selected_answer.as_deref(), question.correct_option_text()) {
                (Some(selected), Some(expected)) => selected == expected,
                _ => false,
            };
            slot.is_correct = Some(correct);
            slot.is_evaluated = true;
            slot.marks_awarded = if correct {
                assigned.effective_marks()
            } else if exam.negative_marking {
                -effective_negative_marks(question.negative_marks, exam.negative_marks)
            } else {
                0.0
            };
        }
        _ => {
            // Descriptive and coding answers wait for the grading delegate,
            // but an empty slot has nothing to grade.
            let has_content = slot
                .text_answer
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
                || slot
                    .code_answer
                    .as_deref()
                    .is_some_and(|c| !c.trim().is_empty());
            slot.is_correct = None;
            slot.marks_awarded = 0.0;
            slot.is_evaluated = !has_content;
        }
    }
}

/// Question-level negative marks win when set (> 0), otherwise the exam's
/// global value applies
fn effective_negative_marks(question_level: f64, exam_level: f64) -> f64 {
    if question_level > 0.0 {
        question_level
    } else {
        exam_level
    }
}

/// Outcome of applying a manual grade to a session's answer list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeOutcome {
    Applied,
    /// The slot was already evaluated (by the objective rule or an earlier
    /// grade); regrades are rejected rather than silently overwritten
    AlreadyEvaluated,
    NoSuchAnswer,
}

/// Apply a manual grade from the evaluation delegate to one answer slot.
/// Only unevaluated slots accept a grade.
pub fn apply_grade(
    answers: &mut [Answer],
    question_id: &Uuid,
    marks_awarded: f64,
    feedback: Option<&str>,
    evaluator_id: &Uuid,
    now: DateTime<Utc>,
) -> GradeOutcome {
    let Some(slot) = answers.iter_mut().find(|a| &a.question_id == question_id) else {
        return GradeOutcome::NoSuchAnswer;
    };
    if slot.is_evaluated {
        return GradeOutcome::AlreadyEvaluated;
    }

    slot.marks_awarded = marks_awarded;
    slot.is_evaluated = true;
    slot.evaluated_by = Some(*evaluator_id);
    slot.evaluated_at = Some(now);
    slot.feedback = feedback.map(|f| f.to_string());
    GradeOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionOption};
    use chrono::Duration;
    use sqlx::types::Json;

    fn exam(negative_marking: bool, negative_marks: f64) -> Exam {
        let now = Utc::now();
        Exam {
            id: Uuid::new_v4(),
            title: "Finals".to_string(),
            description: None,
            start_time: now - Duration::minutes(10),
            end_time: now + Duration::minutes(50),
            duration_minutes: 60,
            total_marks: 10.0,
            passing_marks: 4.0,
            randomize_questions: false,
            negative_marking,
            negative_marks,
            results_published: true,
            status: "ongoing".to_string(),
            proctoring_enabled: false,
            max_tab_switches: 0,
            max_fullscreen_exits: 0,
            action_on_limit: "warn".to_string(),
            total_attempts: 0,
            average_score: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn assigned(
        question_type: &str,
        options: Vec<(&str, bool)>,
        marks: f64,
        negative_marks: f64,
    ) -> AssignedQuestion {
        AssignedQuestion {
            question: Question {
                id: Uuid::new_v4(),
                question_type: question_type.to_string(),
                question_text: "q".to_string(),
                options: Json(
                    options
                        .into_iter()
                        .map(|(text, is_correct)| QuestionOption {
                            text: text.to_string(),
                            is_correct,
                        })
                        .collect(),
                ),
                marks,
                negative_marks,
            },
            position: 0,
            marks_override: None,
        }
    }

    fn submitted(question_id: Uuid, selected: Option<&str>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_answer: selected.map(|s| s.to_string()),
            text_answer: None,
            code_answer: None,
        }
    }

    #[test]
    fn test_correct_answer_awards_full_marks() {
        let exam = exam(true, 2.0);
        let q = assigned("mcq", vec![("a", false), ("b", true)], 5.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result =
            evaluate_submission(&exam, &[q], &base, &[submitted(qid, Some("b"))]);
        assert_eq!(result.score, 5.0);
        assert_eq!(result.answers[0].is_correct, Some(true));
        assert!(!result.has_pending);
    }

    #[test]
    fn test_incorrect_answer_deducts_global_negative_marks() {
        let exam = exam(true, 2.0);
        let q = assigned("mcq", vec![("a", false), ("b", true)], 5.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result =
            evaluate_submission(&exam, &[q], &base, &[submitted(qid, Some("a"))]);
        assert_eq!(result.score, -2.0);
        assert_eq!(result.answers[0].is_correct, Some(false));
    }

    #[test]
    fn test_unanswered_objective_treated_as_incorrect() {
        let exam = exam(true, 2.0);
        let q = assigned("mcq", vec![("a", false), ("b", true)], 5.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result = evaluate_submission(&exam, &[q], &base, &[]);
        assert_eq!(result.score, -2.0);
        assert_eq!(result.answers[0].is_correct, Some(false));
    }

    #[test]
    fn test_question_level_negative_marks_win() {
        let exam = exam(true, 2.0);
        let q = assigned("true_false", vec![("true", true), ("false", false)], 1.0, 0.5);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result =
            evaluate_submission(&exam, &[q], &base, &[submitted(qid, Some("false"))]);
        assert_eq!(result.score, -0.5);
    }

    #[test]
    fn test_no_deduction_when_negative_marking_disabled() {
        let exam = exam(false, 2.0);
        let q = assigned("mcq", vec![("a", true), ("b", false)], 5.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result =
            evaluate_submission(&exam, &[q], &base, &[submitted(qid, Some("b"))]);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_marks_override_beats_question_marks() {
        let exam = exam(false, 0.0);
        let mut q = assigned("mcq", vec![("a", true)], 5.0, 0.0);
        q.marks_override = Some(8.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result =
            evaluate_submission(&exam, &[q], &base, &[submitted(qid, Some("a"))]);
        assert_eq!(result.score, 8.0);
    }

    #[test]
    fn test_descriptive_with_content_stays_pending() {
        let exam = exam(false, 0.0);
        let q = assigned("descriptive", vec![], 10.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];
        let payload = SubmittedAnswer {
            question_id: qid,
            selected_answer: None,
            text_answer: Some("An essay.".to_string()),
            code_answer: None,
        };

        let result = evaluate_submission(&exam, &[q], &base, &[payload]);
        assert!(result.has_pending);
        assert!(!result.answers[0].is_evaluated);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_empty_descriptive_needs_no_grading() {
        let exam = exam(false, 0.0);
        let q = assigned("descriptive", vec![], 10.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result = evaluate_submission(&exam, &[q], &base, &[]);
        assert!(!result.has_pending);
        assert!(result.answers[0].is_evaluated);
    }

    #[test]
    fn test_unknown_question_id_is_ignored() {
        let exam = exam(false, 0.0);
        let q = assigned("mcq", vec![("a", true)], 5.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];

        let result = evaluate_submission(
            &exam,
            &[q],
            &base,
            &[submitted(Uuid::new_v4(), Some("a")), submitted(qid, Some("a"))],
        );
        assert_eq!(result.answers.len(), 1);
        assert_eq!(result.score, 5.0);
    }

    #[test]
    fn test_autosaved_answer_used_when_not_resubmitted() {
        let exam = exam(false, 0.0);
        let q = assigned("mcq", vec![("a", true), ("b", false)], 5.0, 0.0);
        let qid = q.question.id;
        let mut slot = Answer::skeleton(qid);
        slot.selected_answer = Some("a".to_string());

        let result = evaluate_submission(&exam, &[q], &[slot], &[]);
        assert_eq!(result.score, 5.0);
    }

    #[test]
    fn test_apply_grade_sets_audit_fields() {
        let qid = Uuid::new_v4();
        let evaluator = Uuid::new_v4();
        let mut answers = vec![Answer::skeleton(qid)];
        let now = Utc::now();

        assert_eq!(
            apply_grade(&mut answers, &qid, 7.5, Some("good"), &evaluator, now),
            GradeOutcome::Applied
        );
        assert_eq!(answers[0].marks_awarded, 7.5);
        assert!(answers[0].is_evaluated);
        assert_eq!(answers[0].evaluated_by, Some(evaluator));
        assert_eq!(answers[0].feedback.as_deref(), Some("good"));

        assert_eq!(
            apply_grade(&mut answers, &Uuid::new_v4(), 1.0, None, &evaluator, now),
            GradeOutcome::NoSuchAnswer
        );
    }

    #[test]
    fn test_evaluated_answer_rejects_regrade() {
        let exam = exam(false, 0.0);
        let q = assigned("mcq", vec![("a", true), ("b", false)], 5.0, 0.0);
        let qid = q.question.id;
        let base = vec![Answer::skeleton(qid)];
        let result =
            evaluate_submission(&exam, &[q], &base, &[submitted(qid, Some("b"))]);

        let mut answers = result.answers;
        assert!(answers[0].is_evaluated);

        let outcome =
            apply_grade(&mut answers, &qid, 5.0, None, &Uuid::new_v4(), Utc::now());
        assert_eq!(outcome, GradeOutcome::AlreadyEvaluated);
        assert_eq!(answers[0].marks_awarded, 0.0);
        assert_eq!(answers[0].is_correct, Some(false));
        assert_eq!(answers[0].evaluated_by, None);
    }
}
