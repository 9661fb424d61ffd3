//! Time utilities

use chrono::{DateTime, Utc};

/// Get current UTC time
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Whole minutes between two instants, rounded to nearest.
///
/// Used for a session's total time taken; negative spans clamp to zero.
pub fn elapsed_minutes_rounded(from: DateTime<Utc>, to: DateTime<Utc>) -> i32 {
    let seconds = (to - from).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    ((seconds as f64 / 60.0).round()) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_elapsed_minutes_rounds_to_nearest() {
        let start = Utc::now();
        assert_eq!(elapsed_minutes_rounded(start, start + Duration::seconds(89)), 1);
        assert_eq!(elapsed_minutes_rounded(start, start + Duration::seconds(91)), 2);
        assert_eq!(elapsed_minutes_rounded(start, start + Duration::seconds(30)), 1);
        assert_eq!(elapsed_minutes_rounded(start, start + Duration::seconds(29)), 0);
    }

    #[test]
    fn test_elapsed_minutes_clamps_negative() {
        let start = Utc::now();
        assert_eq!(elapsed_minutes_rounded(start, start - Duration::minutes(5)), 0);
    }
}
