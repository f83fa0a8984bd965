#![cfg(test)]

// Property tests for BidiMap kept inside the crate so they do not
// require feature gates to access internal modules.

use crate::bidi_map::BidiMap;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i64),
    Remove(usize),
    Get(usize),
    ReverseLookup(i64),
    Contains(String),
    Values,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        // Small value domain so buckets actually share keys.
        let val = -3i64..=3i64;
        let op = prop_oneof![
            (idx.clone(), val.clone()).prop_map(|(i, v)| OpI::Put(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            val.prop_map(OpI::ReverseLookup),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            Just(OpI::Values),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Bidirectional consistency against the model:
// - forward[k] == v iff reverse_lookup(v) lists k exactly once;
// - no key appears under a bucket for a value it does not hold;
// - the bucket sizes sum to len().
fn check_consistency(
    sut: &BidiMap<Key, i64>,
    model: &HashMap<Key, i64>,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(sut.len(), model.len());
    prop_assert_eq!(sut.is_empty(), model.is_empty());

    let mut bucketed = 0usize;
    for v in -3i64..=3 {
        let bucket = sut.reverse_lookup(&v);
        bucketed += bucket.len();
        prop_assert_eq!(sut.contains_value(&v), !bucket.is_empty());
        for k in &bucket {
            prop_assert_eq!(model.get(k), Some(&v), "bucket key must hold the bucket value");
        }
        for (k, mv) in model {
            let occurrences = bucket.iter().filter(|bk| *bk == k).count();
            prop_assert_eq!(occurrences, usize::from(*mv == v));
        }
    }
    prop_assert_eq!(bucketed, model.len());
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap,
// with the bidirectional-consistency invariant re-checked after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: BidiMap<Key, i64> = BidiMap::new();
        let mut model: HashMap<Key, i64> = HashMap::new();

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = key_from(&pool, i);
                    let prev = sut.put(k.clone(), v);
                    let model_prev = model.insert(k, v);
                    prop_assert_eq!(prev, model_prev);
                }
                OpI::Remove(i) => {
                    let k = key_from(&pool, i);
                    let removed = sut.remove(k.0.as_str());
                    let model_removed = model.remove(&k);
                    prop_assert_eq!(removed, model_removed);
                }
                OpI::Get(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.get(k.0.as_str()), model.get(&k));
                }
                OpI::ReverseLookup(v) => {
                    // Membership and multiplicity are covered by
                    // check_consistency; here just assert snapshot isolation.
                    let mut snap = sut.reverse_lookup(&v);
                    snap.push(Key("intruder".to_string()));
                    let again = sut.reverse_lookup(&v);
                    prop_assert!(again.iter().all(|k| k.0 != "intruder"));
                }
                OpI::Contains(s) => {
                    let has = sut.contains_key(s.as_str());
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(has, has_model);
                }
                OpI::Values => {
                    // One item per forward entry, repeated per key.
                    let mut got: Vec<i64> = sut.values().copied().collect();
                    let mut expected: Vec<i64> = model.values().copied().collect();
                    got.sort_unstable();
                    expected.sort_unstable();
                    prop_assert_eq!(got, expected);
                }
            }

            check_consistency(&sut, &model)?;
        }
    }
}

// Collision variant using a constant hasher to stress equality resolution
// in both tables at once.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: the same invariants hold under worst-case collision behavior.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: BidiMap<Key, i64, ConstBuildHasher> =
            BidiMap::with_hasher(ConstBuildHasher);
        let mut model: HashMap<Key, i64> = HashMap::new();

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = key_from(&pool, i);
                    let prev = sut.put(k.clone(), v);
                    prop_assert_eq!(prev, model.insert(k, v));
                }
                OpI::Remove(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
                }
                OpI::Get(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.get(k.0.as_str()), model.get(&k));
                }
                OpI::ReverseLookup(v) => {
                    for k in sut.reverse_lookup(&v) {
                        prop_assert_eq!(model.get(&k), Some(&v));
                    }
                }
                OpI::Contains(s) => {
                    let has = sut.contains_key(s.as_str());
                    prop_assert_eq!(has, model.keys().any(|k| k.0 == s));
                }
                OpI::Values => {
                    prop_assert_eq!(sut.values().count(), model.len());
                }
            }

            prop_assert_eq!(sut.len(), model.len());
        }
    }
}
