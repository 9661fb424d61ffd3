//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod exam;
pub mod question;
pub mod session;

pub use exam::*;
pub use question::*;
pub use session::*;
