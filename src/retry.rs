//! Interval parsing for the retry-after/polling timers (spec.md §4.4).

use std::time::Duration;

/// Parse a `retry_after` header-equivalent as base-10 decimal seconds. A
/// present-but-unparsable value degrades to `default` rather than
/// surfacing an error (spec.md §8 boundary case) — a malformed advisory
/// header should not abort the whole registration.
pub fn interval_or_default(retry_after: Option<&str>, default: Duration) -> Duration {
    match retry_after.and_then(|value| value.parse::<u64>().ok()) {
        Some(secs) => Duration::from_secs(secs),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base_10_seconds() {
        assert_eq!(
            interval_or_default(Some("5"), Duration::from_secs(99)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn absent_is_default() {
        assert_eq!(
            interval_or_default(None, Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn unparsable_is_default() {
        assert_eq!(
            interval_or_default(Some("soon"), Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }
}
