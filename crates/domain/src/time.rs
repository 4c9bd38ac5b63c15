//! Wall-clock helpers in the unit the vendor cloud speaks: milliseconds since
//! the Unix epoch (`timeOfSample`).

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render an epoch-millisecond sample time as RFC 3339, or `None` when it is
/// out of range.
#[must_use]
pub fn sample_time_rfc3339(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_express_now_in_milliseconds() {
        let before = Utc::now().timestamp_millis();
        let ms = now_millis();
        let after = Utc::now().timestamp_millis();
        assert!(ms >= before);
        assert!(ms <= after);
    }

    #[test]
    fn should_render_sample_time() {
        assert_eq!(
            sample_time_rfc3339(1_698_720_698_088).as_deref(),
            Some("2023-10-31T02:51:38.088Z")
        );
    }

    #[test]
    fn should_reject_out_of_range_sample_time() {
        assert!(sample_time_rfc3339(i64::MAX).is_none());
    }
}
