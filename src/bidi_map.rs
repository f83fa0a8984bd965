//! BidiMap: structural layer keeping a forward map and a reverse index consistent.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashMap;
use std::collections::hash_map::RandomState;

/// A key -> value map that also maintains a value -> keys reverse index.
///
/// The forward table holds one entry per key. The reverse table holds one
/// bucket per distinct value, listing the keys currently mapped to that
/// value in first-write order. Every mutation updates both tables before
/// returning, so the two views never disagree:
///
/// - `forward[k] == v` iff `reverse[v]` contains `k` exactly once.
/// - A key is never listed under two buckets at once.
/// - A bucket that loses its last key is removed from the reverse table.
///
/// This layer is single-threaded and lock-free; user code only runs via
/// `K: Eq + Hash` / `V: Eq + Hash` during probing. Callers that need
/// shared-memory concurrency serialize access above this layer.
pub struct BidiMap<K, V, S = RandomState> {
    forward: HashMap<K, V, S>,
    reverse: HashMap<V, Vec<K>, S>,
}

impl<K, V> BidiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Preallocate both tables. The hint affects only allocation, never
    /// behavior.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for BidiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over stored values, one item per forward entry.
///
/// A value shared by several keys is yielded once per key holding it, not
/// once per distinct value; range scans above this layer rely on that
/// multiplicity.
pub struct Values<'a, K, V> {
    it: hashbrown::hash_map::Values<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
}

/// Iterator over forward entries as `(&K, &V)` pairs.
pub struct Iter<'a, K, V> {
    it: hashbrown::hash_map::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
}

impl<K, V, S> BidiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            forward: HashMap::with_hasher(hasher.clone()),
            reverse: HashMap::with_hasher(hasher),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            forward: HashMap::with_capacity_and_hasher(capacity, hasher.clone()),
            reverse: HashMap::with_capacity_and_hasher(capacity, hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Insert or overwrite; returns the previous value if any.
    ///
    /// On overwrite the key leaves the old value's bucket before joining
    /// the new value's bucket, so the exactly-once invariant holds at
    /// every return.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let prev = self.forward.insert(key.clone(), value.clone());
        if let Some(old) = prev.as_ref() {
            self.unlink(old, &key);
        }
        self.reverse.entry(value).or_default().push(key);
        prev
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.forward.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.forward.contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool {
        self.reverse.contains_key(value)
    }

    /// Remove the forward entry and its reverse membership together.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (key, value) = self.forward.remove_entry(key)?;
        self.unlink(&value, &key);
        Some(value)
    }

    /// All keys currently mapped to exactly `value`, in first-write order.
    ///
    /// Returns a snapshot copy; mutating the result never touches internal
    /// state. Absent values yield an empty vec.
    pub fn reverse_lookup(&self, value: &V) -> Vec<K> {
        self.reverse.get(value).cloned().unwrap_or_default()
    }

    /// One item per forward entry; a fresh call restarts the walk.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            it: self.forward.values(),
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.forward.iter(),
        }
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    // Drop `key` from `value`'s bucket, removing the bucket when it empties.
    fn unlink(&mut self, value: &V, key: &K) {
        if let Some(bucket) = self.reverse.get_mut(value) {
            if let Some(pos) = bucket.iter().position(|k| k == key) {
                bucket.remove(pos);
            }
            if bucket.is_empty() {
                self.reverse.remove(value);
            }
        }
    }
}
