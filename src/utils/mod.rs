//! Utility functions

pub mod time;

pub use time::{elapsed_minutes_rounded, now_utc};
