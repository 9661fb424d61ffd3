//! Exam definition model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Exam definition database model
///
/// Owned by the exam-authoring side of the platform; this core reads it for
/// timing, marks, and proctoring policy, and lazily corrects `status`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub total_marks: f64,
    pub passing_marks: f64,
    pub randomize_questions: bool,
    pub negative_marking: bool,
    pub negative_marks: f64,
    pub results_published: bool,
    pub status: String,
    pub proctoring_enabled: bool,
    pub max_tab_switches: i32,
    pub max_fullscreen_exits: i32,
    pub action_on_limit: String,
    pub total_attempts: i64,
    pub average_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    /// Compute the lifecycle status this exam should have at `now`.
    ///
    /// `draft` and `cancelled` are sticky and never auto-transitioned;
    /// everything else is a projection of the time window. Callers persist
    /// the correction if it differs from the stored value.
    pub fn reconciled_status(&self, now: DateTime<Utc>) -> ExamStatus {
        match ExamStatus::from_str(&self.status) {
            Some(ExamStatus::Draft) => ExamStatus::Draft,
            Some(ExamStatus::Cancelled) => ExamStatus::Cancelled,
            _ => {
                if now < self.start_time {
                    ExamStatus::Scheduled
                } else if now <= self.end_time {
                    ExamStatus::Ongoing
                } else {
                    ExamStatus::Completed
                }
            }
        }
    }

    /// Check whether `now` falls inside the active window `[start, end)`.
    pub fn is_window_open(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time && now < self.end_time
    }
}

/// Exam lifecycle status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamStatus {
    Draft,
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

impl ExamStatus {
    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "scheduled" => Some(Self::Scheduled),
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn exam_with(status: &str, start_offset_min: i64, end_offset_min: i64) -> Exam {
        let now = Utc::now();
        Exam {
            id: Uuid::new_v4(),
            title: "Midterm".to_string(),
            description: None,
            start_time: now + Duration::minutes(start_offset_min),
            end_time: now + Duration::minutes(end_offset_min),
            duration_minutes: 60,
            total_marks: 100.0,
            passing_marks: 40.0,
            randomize_questions: false,
            negative_marking: false,
            negative_marks: 0.0,
            results_published: false,
            status: status.to_string(),
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

    #[test]
    fn test_reconciled_status_follows_window() {
        let now = Utc::now();
        assert_eq!(
            exam_with("scheduled", 10, 70).reconciled_status(now),
            ExamStatus::Scheduled
        );
        assert_eq!(
            exam_with("scheduled", -10, 50).reconciled_status(now),
            ExamStatus::Ongoing
        );
        assert_eq!(
            exam_with("ongoing", -120, -60).reconciled_status(now),
            ExamStatus::Completed
        );
    }

    #[test]
    fn test_draft_and_cancelled_are_sticky() {
        let now = Utc::now();
        assert_eq!(
            exam_with("draft", -10, 50).reconciled_status(now),
            ExamStatus::Draft
        );
        assert_eq!(
            exam_with("cancelled", -120, -60).reconciled_status(now),
            ExamStatus::Cancelled
        );
    }

    #[test]
    fn test_window_is_half_open() {
        let exam = exam_with("ongoing", 0, 60);
        assert!(exam.is_window_open(exam.start_time));
        assert!(!exam.is_window_open(exam.end_time));
    }
}
