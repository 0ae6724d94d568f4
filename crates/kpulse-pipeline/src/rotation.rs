//! Time-bucketed rotation over the search-query pool.
//!
//! Each run fetches only `batch_size` queries. The slice is chosen by the
//! current time window, so consecutive windows sweep the whole pool.

use chrono::{DateTime, Utc};

/// Queries to fetch for the window containing `now`.
#[must_use]
pub fn rotation_batch<'a>(
    queries: &'a [String],
    batch_size: usize,
    window_secs: u64,
    now: DateTime<Utc>,
) -> &'a [String] {
    if queries.is_empty() || batch_size == 0 || window_secs == 0 {
        return &[];
    }
    let batches = queries.len().div_ceil(batch_size);
    let window = i64::try_from(window_secs).unwrap_or(i64::MAX);
    let bucket = now.timestamp().div_euclid(window);
    let batch_count = i64::try_from(batches).unwrap_or(i64::MAX);
    let index = usize::try_from(bucket.rem_euclid(batch_count)).unwrap_or(0);

    let start = index * batch_size;
    let end = (start + batch_size).min(queries.len());
    &queries[start..end]
}
