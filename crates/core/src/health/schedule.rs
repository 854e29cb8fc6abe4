//! Selection of torrents whose health check is due.

use chrono::{DateTime, Duration, Utc};

use crate::state::HealthState;

/// Longest interval representable without overflowing timestamp arithmetic.
const MAX_INTERVAL_DAYS: f64 = 1_000_000.0;

/// Convert a check interval in (possibly fractional) days to a duration.
///
/// Negative or NaN input yields zero (everything due); huge values saturate.
pub fn interval_from_days(days: f64) -> Duration {
    let days = if days.is_nan() {
        0.0
    } else {
        days.clamp(0.0, MAX_INTERVAL_DAYS)
    };
    Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

/// Whether one torrent is due: no record, never checked, or checked at least
/// `interval` before `now`.
pub fn is_due(hash: &str, state: &HealthState, interval: Duration, now: DateTime<Utc>) -> bool {
    match state.last_checked(hash) {
        None => true,
        Some(last_checked) => now - last_checked >= interval,
    }
}

/// Return the due subset of `hashes`, in input order.
pub fn select_due<'a, I>(
    hashes: I,
    state: &HealthState,
    interval: Duration,
    now: DateTime<Utc>,
) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    hashes
        .into_iter()
        .filter(|hash| is_due(hash, state, interval, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Classification;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_interval_from_days() {
        assert_eq!(interval_from_days(30.0), Duration::days(30));
        assert_eq!(interval_from_days(0.5), Duration::hours(12));
        assert_eq!(interval_from_days(0.0), Duration::zero());
        assert_eq!(interval_from_days(-3.0), Duration::zero());
        assert_eq!(interval_from_days(f64::INFINITY), Duration::days(1_000_000));
    }

    #[test]
    fn test_absent_torrent_always_due() {
        let state = HealthState::new();
        let interval = Duration::days(30);
        for now in [t0(), t0() - Duration::days(10_000), t0() + Duration::days(10_000)] {
            assert_eq!(select_due(["abc"], &state, interval, now), vec!["abc"]);
        }
    }

    #[test]
    fn test_due_exactly_at_interval() {
        let mut state = HealthState::new();
        state.record_check("abc", "abc", 3, Classification::Low, t0());
        let interval = Duration::days(30);

        let just_before = t0() + interval - Duration::milliseconds(1);
        assert!(select_due(["abc"], &state, interval, just_before).is_empty());

        let at = t0() + interval;
        assert_eq!(select_due(["abc"], &state, interval, at), vec!["abc"]);
    }

    #[test]
    fn test_record_without_timestamp_is_due() {
        let json = r#"{"torrents": {"abc": {"name": "x", "last_checked": null}}}"#;
        let state: HealthState = serde_json::from_str(json).unwrap();
        assert!(is_due("abc", &state, Duration::days(30), t0()));
    }

    #[test]
    fn test_zero_interval_everything_due() {
        let mut state = HealthState::new();
        state.record_check("abc", "abc", 3, Classification::Low, t0());
        assert!(is_due("abc", &state, Duration::zero(), t0()));
    }

    #[test]
    fn test_select_due_preserves_input_order() {
        let mut state = HealthState::new();
        state.record_check("fresh", "fresh", 9, Classification::Healthy, t0());
        let now = t0() + Duration::days(1);
        let hashes = ["zzz", "fresh", "aaa", "mmm"];

        let due = select_due(hashes, &state, Duration::days(30), now);
        assert_eq!(due, vec!["zzz", "aaa", "mmm"]);
        assert_eq!(due, select_due(hashes, &state, Duration::days(30), now));
    }
}
