//! tally-map: A thread-safe counter map that keeps a count-to-keys
//! reverse index and running aggregates consistent on every write.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build CounterMap in safe, verifiable layers so each piece can
//!   be reasoned about independently.
//! - Layers:
//!   - BidiMap<K, V, S>: structural map holding the forward K -> V table
//!     and the reverse V -> keys index; every mutation updates both views
//!     before returning, so the two can never be observed out of step.
//!   - CounterMap<K, S>: public counting API that fixes V = i64, adds
//!     accumulate-or-replace write semantics, and tracks min/max
//!     watermarks plus a write-through running sum.
//!
//! Constraints
//! - BidiMap is single-threaded and lock-free; it only invokes user code
//!   via `K: Eq/Hash` and `V: Eq/Hash` during probing.
//! - CounterMap serializes every mutation and every compound read (range
//!   queries, batch sums) behind one map-wide `parking_lot::RwLock`;
//!   watermark and sum updates are not individually atomic with the map
//!   write, so they must be observed together under the lock.
//! - The three aggregate scalars are `AtomicI64`s written only while the
//!   write lock is held; the plain accessors read them without the lock
//!   since an aligned 64-bit load cannot tear.
//! - Reverse buckets list keys in first-write order; order among keys
//!   with equal counts is otherwise unspecified.
//!
//! Why this split?
//! - Localize invariants: bidirectional consistency lives entirely in
//!   BidiMap; counting policy (watermarks, write-through sum,
//!   accumulate-or-replace) lives entirely in CounterMap.
//! - Clear failure boundaries: BidiMap never calls into user code once
//!   the structure is consistent, and CounterMap never reaches into the
//!   tables except through BidiMap's operations.
//!
//! Aggregate semantics
//! - min/max are historical watermarks, not a live min/max: they stretch
//!   on every write and never retreat, even when every key holding the
//!   extreme is later overwritten or removed.
//! - The running sum adds every count passed to `set`/`put`; overwrites
//!   do not subtract the value they replace. Downstream accounting
//!   depends on both behaviors, so they are part of the contract.
//!
//! Overflow semantics
//! - Counts are plain `i64`s; accumulation and the running sum wrap on
//!   overflow, matching the atomics they feed.
//!
//! Notes and non-goals
//! - No eviction and no capacity bound; the map grows as keys are added.
//! - No persistence and no cross-process sharing.
//! - Range queries may return duplicate keys: the scan walks one item
//!   per forward entry and re-appends the full bucket at every in-range
//!   encounter. Callers tolerate the duplicates; some treat the
//!   multiplicity as a weighting signal, so the scan must not dedupe.
//! - Public API surface is `CounterMap` and the `BidiMap` layer it owns;
//!   `BidiMap` is exported for callers that need a plain bidirectional
//!   map without counting policy.

pub mod bidi_map;
mod bidi_map_proptest;
mod counter_map;

// Public surface
pub use bidi_map::BidiMap;
pub use counter_map::CounterMap;
