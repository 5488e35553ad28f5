use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp id, bumped past the last one handed out so that
/// two calls within the same millisecond still differ.
///
/// # Examples
/// ```
/// use chousei_libs::id::next_id;
///
/// let a: i64 = next_id().parse().unwrap();
/// let b: i64 = next_id().parse().unwrap();
/// assert!(b > a);
/// ```
pub fn next_id() -> String {
    let now = Utc::now().timestamp_millis();

    let previous = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);

    now.max(previous + 1).to_string()
}
