//! Time Utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Compact UTC timestamp used to name per-run artifacts,
/// e.g. `20260118T093015123`.
pub fn run_stamp(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_stamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 1, 18, 9, 30, 15).unwrap();
        assert_eq!(run_stamp(&at), "20260118T093015000");
    }

    #[test]
    fn test_run_stamp_is_filename_safe() {
        let stamp = run_stamp(&now_utc());
        assert!(stamp.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
