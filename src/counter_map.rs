//! CounterMap: thread-safe counting API atop BidiMap, with running aggregates.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::RwLock;

use crate::bidi_map::BidiMap;

/// A map from keys to `i64` counts with a count-to-keys reverse index and
/// running aggregates, safe to share across threads.
///
/// Aggregate semantics, kept deliberately:
///
/// - `min_value`/`max_value` are watermarks of every count ever stored,
///   not a live min/max of current entries. Once stretched away from zero
///   they never retreat, even when every key at the extreme is later
///   overwritten or removed.
/// - `sum_value` is a write-through total: every `set`/`put` adds its
///   argument, and overwrites never subtract the value they replace. It is
///   the sum of all counts ever written, not the sum of current entries.
///
/// All mutations and all compound reads (range queries, batch sums) run
/// under one map-wide lock; the scalar aggregate accessors are lock-free
/// atomic loads. Counts are plain `i64`s and wrap on overflow.
pub struct CounterMap<K, S = RandomState> {
    map: RwLock<BidiMap<K, i64, S>>,
    // Written only while the write lock is held; read lock-free by the
    // plain accessors.
    min_value: AtomicI64,
    max_value: AtomicI64,
    sum_value: AtomicI64,
}

impl<K> CounterMap<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Preallocate the underlying tables. The hint affects only
    /// allocation, never behavior.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: RwLock::new(BidiMap::with_capacity(capacity)),
            min_value: AtomicI64::new(0),
            max_value: AtomicI64::new(0),
            sum_value: AtomicI64::new(0),
        }
    }
}

impl<K> Default for CounterMap<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> CounterMap<K, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            map: RwLock::new(BidiMap::with_hasher(hasher)),
            min_value: AtomicI64::new(0),
            max_value: AtomicI64::new(0),
            sum_value: AtomicI64::new(0),
        }
    }

    /// Overwrite the count for `key`; returns the previous count, or 0 if
    /// the key was absent.
    ///
    /// The full `count` joins the running sum even when it replaces an
    /// existing entry; the replaced count is not subtracted.
    pub fn set(&self, key: K, count: i64) -> i64 {
        let mut map = self.map.write();
        self.set_locked(&mut map, key, count)
    }

    /// Accumulate-or-replace write; returns the previous count, or 0 if
    /// the key was absent.
    ///
    /// A strictly positive `delta` applied to an existing key adds to the
    /// stored count. Any other write (fresh key, or `delta <= 0`) stores
    /// `delta` verbatim, so decrementing an existing counter resets it to
    /// the delta rather than subtracting from it. Callers that poll for
    /// counters pushed below a threshold rely on the reset behavior.
    pub fn put(&self, key: K, delta: i64) -> i64 {
        let mut map = self.map.write();
        self.put_locked(&mut map, key, delta)
    }

    /// `put(key, 1)`.
    pub fn increment(&self, key: K) -> i64 {
        self.put(key, 1)
    }

    /// `put(key, -1)`; on an existing key this stores -1 outright.
    pub fn decrement(&self, key: K) -> i64 {
        self.put(key, -1)
    }

    /// Apply `put` to every entry, in iteration order, under one lock
    /// acquisition.
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, i64)>,
    {
        let mut map = self.map.write();
        for (key, delta) in entries {
            self.put_locked(&mut map, key, delta);
        }
    }

    /// Apply `set` to every entry, in iteration order, under one lock
    /// acquisition.
    pub fn set_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, i64)>,
    {
        let mut map = self.map.write();
        for (key, count) in entries {
            self.set_locked(&mut map, key, count);
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.read().get(key).copied()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Remove `key` from both views; returns the stored count if any.
    ///
    /// The aggregates are untouched: watermarks never retreat and the
    /// running sum keeps every count ever written.
    pub fn remove<Q>(&self, key: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.write().remove(key)
    }

    /// Keys whose count is exactly `count`, in first-write order.
    pub fn reverse_equal(&self, count: i64) -> Vec<K> {
        self.map.read().reverse_lookup(&count)
    }

    /// Keys whose count is at least `count`, bounded above by the max
    /// watermark.
    pub fn reverse_greater_equal(&self, count: i64) -> Vec<K> {
        let map = self.map.read();
        let hi = self.max_value.load(Ordering::Relaxed);
        Self::range_locked(&map, count, hi)
    }

    /// Keys whose count is strictly greater than `count`.
    pub fn reverse_greater(&self, count: i64) -> Vec<K> {
        match count.checked_add(1) {
            Some(lo) => self.reverse_greater_equal(lo),
            None => Vec::new(),
        }
    }

    /// Keys whose count is at most `count`, bounded below by the min
    /// watermark.
    pub fn reverse_less_equal(&self, count: i64) -> Vec<K> {
        let map = self.map.read();
        let lo = self.min_value.load(Ordering::Relaxed);
        Self::range_locked(&map, lo, count)
    }

    /// Keys whose count is strictly less than `count`.
    pub fn reverse_less(&self, count: i64) -> Vec<K> {
        match count.checked_sub(1) {
            Some(hi) => self.reverse_less_equal(hi),
            None => Vec::new(),
        }
    }

    /// Keys whose count falls in `[min_count, max_count]`.
    ///
    /// The scan walks one item per forward entry and appends the full
    /// bucket snapshot for every in-range item it meets, so a count shared
    /// by m keys contributes its bucket m times; callers tolerate the
    /// duplicates and some treat the multiplicity as a weighting signal.
    /// An inverted range yields an empty result.
    pub fn reverse_range(&self, min_count: i64, max_count: i64) -> Vec<K> {
        let map = self.map.read();
        Self::range_locked(&map, min_count, max_count)
    }

    /// Min watermark: the lowest count ever written, or 0. Lock-free read.
    pub fn min_value(&self) -> i64 {
        self.min_value.load(Ordering::Relaxed)
    }

    /// Max watermark: the highest count ever written, or 0. Lock-free read.
    pub fn max_value(&self) -> i64 {
        self.max_value.load(Ordering::Relaxed)
    }

    /// Write-through running sum of every count ever written. Lock-free
    /// read.
    pub fn sum_value(&self) -> i64 {
        self.sum_value.load(Ordering::Relaxed)
    }

    /// Sum of the current counts for `keys`; absent keys contribute 0.
    pub fn sum_of<'a, Q, I>(&self, keys: I) -> i64
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        let map = self.map.read();
        keys.into_iter().filter_map(|key| map.get(key)).sum()
    }

    /// `sum_value()` minus `sum_of(keys)`, both taken under one read lock.
    ///
    /// Subtracts from the write-through total, not from a sum of current
    /// entries.
    pub fn sum_excluding<'a, Q, I>(&self, keys: I) -> i64
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        let map = self.map.read();
        let total = self.sum_value.load(Ordering::Relaxed);
        total - keys.into_iter().filter_map(|key| map.get(key)).sum::<i64>()
    }

    fn set_locked(&self, map: &mut BidiMap<K, i64, S>, key: K, count: i64) -> i64 {
        self.sum_value.fetch_add(count, Ordering::Relaxed);
        self.stretch_watermarks(count);
        map.put(key, count).unwrap_or(0)
    }

    fn put_locked(&self, map: &mut BidiMap<K, i64, S>, key: K, delta: i64) -> i64 {
        self.sum_value.fetch_add(delta, Ordering::Relaxed);
        let mut next = delta;
        if delta > 0 {
            if let Some(&current) = map.get(&key) {
                next = delta.wrapping_add(current);
            }
        }
        self.stretch_watermarks(next);
        map.put(key, next).unwrap_or(0)
    }

    // Stretch the watermarks toward `count`; they never move back.
    fn stretch_watermarks(&self, count: i64) {
        self.min_value.fetch_min(count, Ordering::Relaxed);
        self.max_value.fetch_max(count, Ordering::Relaxed);
    }

    fn range_locked(map: &BidiMap<K, i64, S>, lo: i64, hi: i64) -> Vec<K> {
        let mut keys = Vec::new();
        for &count in map.values() {
            if lo <= count && count <= hi {
                keys.extend(map.reverse_lookup(&count));
            }
        }
        keys
    }
}
