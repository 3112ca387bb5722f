use anyhow::Result;

/// Persistence contract shared by every service: scalar key-value records,
/// unordered string sets, and score-ordered sets.
///
/// Each call is atomic on its own key. Nothing spans keys; callers that touch
/// two keys issue two calls and live with the window in between.
pub trait RecordStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the key from every keyspace. Returns whether anything existed.
    fn del(&self, key: &str) -> Result<bool>;

    /// Atomic read-modify-write of one scalar key. `apply` sees the current
    /// value; returning `Some` stores it, `None` leaves the key untouched.
    /// Returns what was stored.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
    ) -> Result<Option<String>>;

    /// Returns how many members were not already present.
    fn set_add(&self, key: &str, members: &[&str]) -> Result<usize>;

    fn set_members(&self, key: &str) -> Result<Vec<String>>;

    /// Inserts or rescores members. Returns how many were newly added.
    fn ranked_add(&self, key: &str, entries: &[(&str, i64)]) -> Result<usize>;

    /// Adds `delta` to a member's score, creating it at `delta`. Returns the new score.
    fn ranked_increment(&self, key: &str, delta: i64, member: &str) -> Result<i64>;

    /// Members by descending score, `start..=stop` inclusive. Negative indices
    /// count from the end, so `(0, -1)` is the whole set. Equal scores keep
    /// insertion order.
    fn ranked_range_desc(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// 0-based position of `member` in descending order.
    fn ranked_rank_desc(&self, key: &str, member: &str) -> Result<Option<usize>>;

    fn ranked_score(&self, key: &str, member: &str) -> Result<Option<i64>>;
}

/// Clamps a Redis-style inclusive range onto a set of `len` members.
/// Returns `(offset, count)` or `None` when the range selects nothing.
pub(crate) fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    if len == 0 {
        return None;
    }

    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, (stop - start + 1) as usize))
}
