//! Invigil - Exam Session Engine
//!
//! This library provides the core functionality for the Invigil platform:
//! the lifecycle of timed, proctored assessment attempts, from creation
//! through concurrent mutation to exactly-once finalization.
//!
//! # Features
//!
//! - One attempt per (student, exam) pair, enforced at the storage layer
//! - Objective answer evaluation with negative marking
//! - Atomic violation logging with threshold enforcement (warn/auto-submit/lock)
//! - Optimistic-concurrency submission that survives interleaved proctoring writes
//! - Lazy exam status reconciliation against the wall clock
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Business logic
//! - **Repositories**: Database access
//! - **Models**: Domain models and DTOs

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
