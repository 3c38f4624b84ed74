/// Retention policy: which tracked threads are old enough to delete
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::settings::RetentionFrequency;
use crate::tracked::TrackedThread;

/// Whole 24 hour days from `then` to `now`. Partial days do not count and
/// timestamps in the future give a negative value.
pub fn whole_days_between(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    now.signed_duration_since(then).num_days()
}

/// Select the ids of threads not viewed within the retention window
///
/// A thread is stale when the whole days since its last visit reach the
/// frequency's day count; exactly on the threshold counts as stale.
/// The store is not touched, the caller deletes the returned ids.
pub fn select_stale_thread_ids<'a, I>(
    tracked: I,
    frequency: RetentionFrequency,
    now: DateTime<Utc>,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a TrackedThread>,
{
    let threshold = frequency.days();

    tracked
        .into_iter()
        .filter(|thread| whole_days_between(now, thread.last_viewed_at) >= threshold)
        .map(|thread| thread.thread_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, month: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, month, day, hour, min, sec).unwrap()
    }

    fn create_test_thread(id: &str, last_viewed_at: DateTime<Utc>) -> TrackedThread {
        TrackedThread::new(
            id.to_string(),
            format!("title {}", id),
            "submitted 4 days ago by user".to_string(),
            "test".to_string(),
            last_viewed_at,
        )
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_whole_days_between_truncates() {
        let now = at(20, 1, 10, 0, 0);
        assert_eq!(whole_days_between(now, at(17, 1, 10, 0, 0)), 3);
        assert_eq!(whole_days_between(now, at(17, 1, 10, 0, 1)), 2);
        assert_eq!(whole_days_between(now, at(20, 1, 9, 59, 59)), 0);
    }

    #[test]
    fn test_nothing_stale_within_window() {
        let threads = vec![
            create_test_thread("a", at(10, 1, 9, 0, 0)),
            create_test_thread("b", at(9, 1, 10, 0, 1)),
        ];
        let now = at(10, 1, 10, 0, 0);

        let stale = select_stale_thread_ids(&threads, RetentionFrequency::Day1, now);

        assert!(stale.is_empty());
    }

    #[test]
    fn test_five_day_window() {
        let threads = vec![
            create_test_thread("a", at(10, 1, 9, 0, 0)),
            // 4 days 23:59:59, inside by one second
            create_test_thread("b", at(5, 1, 10, 0, 1)),
            // exactly 5 days
            create_test_thread("c", at(5, 1, 10, 0, 0)),
            create_test_thread("d", at(5, 1, 9, 59, 59)),
        ];
        let now = at(10, 1, 10, 0, 0);

        let stale = select_stale_thread_ids(&threads, RetentionFrequency::Day5, now);

        assert_eq!(stale, ids(&["c", "d"]));
    }

    #[test]
    fn test_three_day_window_boundary() {
        let threads = vec![
            // 2 days 23:59:59
            create_test_thread("a", at(17, 1, 10, 0, 1)),
            // exactly 3 days
            create_test_thread("b", at(17, 1, 10, 0, 0)),
            create_test_thread("c", at(17, 1, 9, 59, 59)),
            create_test_thread("d", at(16, 1, 10, 0, 0)),
            create_test_thread("e", at(15, 1, 10, 0, 0)),
            create_test_thread("f", at(13, 1, 10, 0, 0)),
            create_test_thread("g", at(6, 1, 10, 0, 0)),
            // one second ago
            create_test_thread("h", at(20, 1, 9, 59, 59)),
        ];
        let now = at(20, 1, 10, 0, 0);

        let stale = select_stale_thread_ids(&threads, RetentionFrequency::Day3, now);

        assert_eq!(stale, ids(&["b", "c", "d", "e", "f", "g"]));
    }

    #[test]
    fn test_future_timestamps_never_stale() {
        let threads = vec![create_test_thread("future", at(25, 1, 10, 0, 0))];
        let now = at(20, 1, 10, 0, 0);

        let stale = select_stale_thread_ids(&threads, RetentionFrequency::Day1, now);

        assert!(stale.is_empty());
    }

    #[test]
    fn test_selection_is_idempotent() {
        let threads = vec![
            create_test_thread("a", at(1, 1, 0, 0, 0)),
            create_test_thread("b", at(19, 1, 0, 0, 0)),
        ];
        let now = at(20, 1, 10, 0, 0);

        let first = select_stale_thread_ids(&threads, RetentionFrequency::Day2, now);
        let second = select_stale_thread_ids(&threads, RetentionFrequency::Day2, now);

        assert_eq!(first, second);
        assert_eq!(first, ids(&["a"]));
    }
}
