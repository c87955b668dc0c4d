//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whole days elapsed between `earlier` and `later`
///
/// Returns 0 when `earlier` is after `later` (clock skew in persisted state).
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_days().max(0)
}

/// Timestamp `days` days before `reference`
pub fn days_before(reference: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    reference - Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_days_between_forward() {
        let later = now();
        let earlier = days_before(later, 30);
        assert_eq!(days_between(earlier, later), 30);
    }

    #[test]
    fn test_days_between_clamps_negative() {
        let earlier = now();
        let later = days_before(earlier, 5);
        assert_eq!(days_between(earlier, later), 0);
    }

    #[test]
    fn test_days_between_same_instant() {
        let t = now();
        assert_eq!(days_between(t, t), 0);
    }
}
