//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// SESSION ENGINE
// =============================================================================

/// Maximum attempts for an optimistic-concurrency write before giving up
pub const SUBMIT_MAX_RETRIES: u32 = 3;

/// Redis list consumed by the external grading delegate
pub const EVALUATION_QUEUE_KEY: &str = "evaluation_queue";

/// User roles
pub mod roles {
    pub const STUDENT: &str = "student";
    pub const EVALUATOR: &str = "evaluator";
    pub const ADMIN: &str = "admin";
}

/// Session lifecycle states
pub mod session_status {
    pub const IN_PROGRESS: &str = "in_progress";
    pub const SUBMITTED: &str = "submitted";
    pub const PENDING_EVALUATION: &str = "pending_evaluation";
    pub const EVALUATED: &str = "evaluated";
    pub const LOCKED: &str = "locked";
}

/// Exam lifecycle states
pub mod exam_status {
    pub const DRAFT: &str = "draft";
    pub const SCHEDULED: &str = "scheduled";
    pub const ONGOING: &str = "ongoing";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";
}

/// Proctoring violation types
pub mod violation_types {
    pub const TAB_SWITCH: &str = "tab_switch";
    pub const TAB_CHANGE: &str = "tab_change";
    pub const FULLSCREEN_EXIT: &str = "fullscreen_exit";
    pub const COPY_PASTE: &str = "copy_paste";
    pub const RIGHT_CLICK: &str = "right_click";
    pub const DEV_TOOLS: &str = "dev_tools";

    /// Accepted vocabulary for incoming violation reports
    pub const KNOWN: &[&str] = &[
        TAB_SWITCH,
        TAB_CHANGE,
        FULLSCREEN_EXIT,
        COPY_PASTE,
        RIGHT_CLICK,
        DEV_TOOLS,
    ];
}

/// Actions taken when a proctoring threshold is breached
pub mod proctoring_actions {
    pub const WARN: &str = "warn";
    pub const AUTO_SUBMIT: &str = "auto_submit";
    pub const LOCK: &str = "lock";
}

/// Unlock request states
pub mod unlock_status {
    pub const NONE: &str = "none";
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}
