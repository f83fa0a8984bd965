// CounterMap property tests (consolidated).
//
// Property 1: scalar model equivalence.
//  - Model: std HashMap for stored counts plus three i64 scalars applying
//    the aggregate rules directly (watermarks stretch and never retreat;
//    the sum adds every written count and never subtracts on overwrite;
//    positive deltas accumulate onto existing keys, anything else
//    replaces).
//  - Operations: set, put, increment, decrement, remove.
//  - Invariant after each op: per-key parity with the model, aggregate
//    parity, and bidirectional consistency of the reverse index.
//
// Property 2: range-scan multiset equivalence.
//  - Expected output of reverse_range(lo, hi): each key holding an
//    in-range count v appears once per forward entry holding v (the scan
//    re-appends the full bucket at every in-range encounter).
//
// Property 3: batch-sum complement.
//  - sum_of(keys) + sum_excluding(keys) == sum_value() for any subset.
use proptest::prelude::*;
use std::collections::HashMap;
use tally_map::CounterMap;

#[derive(Clone, Debug)]
enum Op {
    Set(usize, i64),
    Put(usize, i64),
    Increment(usize),
    Decrement(usize),
    Remove(usize),
}

const POOL: usize = 6;

fn key(i: usize) -> String {
    format!("k{}", i % POOL)
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let idx = 0usize..64;
    let val = -4i64..=4i64;
    let op = prop_oneof![
        (idx.clone(), val.clone()).prop_map(|(i, v)| Op::Set(i, v)),
        (idx.clone(), val).prop_map(|(i, d)| Op::Put(i, d)),
        idx.clone().prop_map(Op::Increment),
        idx.clone().prop_map(Op::Decrement),
        idx.prop_map(Op::Remove),
    ];
    proptest::collection::vec(op, 1..100)
}

struct Model {
    counts: HashMap<String, i64>,
    min: i64,
    max: i64,
    sum: i64,
}

impl Model {
    fn new() -> Self {
        Self {
            counts: HashMap::new(),
            min: 0,
            max: 0,
            sum: 0,
        }
    }

    fn stretch(&mut self, count: i64) {
        self.min = self.min.min(count);
        self.max = self.max.max(count);
    }

    fn set(&mut self, k: String, count: i64) -> i64 {
        self.sum = self.sum.wrapping_add(count);
        self.stretch(count);
        self.counts.insert(k, count).unwrap_or(0)
    }

    fn put(&mut self, k: String, delta: i64) -> i64 {
        self.sum = self.sum.wrapping_add(delta);
        let next = match self.counts.get(&k) {
            Some(&current) if delta > 0 => delta.wrapping_add(current),
            _ => delta,
        };
        self.stretch(next);
        self.counts.insert(k, next).unwrap_or(0)
    }

    fn remove(&mut self, k: &str) -> Option<i64> {
        self.counts.remove(k)
    }
}

// The multiset reverse_range must produce: each key with in-range count v,
// repeated once per forward entry holding v.
fn expected_range(model: &Model, lo: i64, hi: i64) -> Vec<String> {
    let mut out = Vec::new();
    for (k, &v) in &model.counts {
        if lo <= v && v <= hi {
            let bucket_size = model.counts.values().filter(|&&mv| mv == v).count();
            for _ in 0..bucket_size {
                out.push(k.clone());
            }
        }
    }
    out.sort();
    out
}

fn check_parity(sut: &CounterMap<String>, model: &Model) -> Result<(), TestCaseError> {
    prop_assert_eq!(sut.len(), model.counts.len());
    prop_assert_eq!(sut.min_value(), model.min);
    prop_assert_eq!(sut.max_value(), model.max);
    prop_assert_eq!(sut.sum_value(), model.sum);

    for i in 0..POOL {
        let k = key(i);
        prop_assert_eq!(sut.get(k.as_str()), model.counts.get(&k).copied());
    }

    // Bidirectional consistency: each stored key sits in exactly one
    // bucket, the one for its own count.
    for v in -10i64..=10 {
        let bucket = sut.reverse_equal(v);
        for k in &bucket {
            prop_assert_eq!(model.counts.get(k), Some(&v));
        }
        for (k, &mv) in &model.counts {
            let occurrences = bucket.iter().filter(|bk| *bk == k).count();
            prop_assert_eq!(occurrences, usize::from(mv == v));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_scalar_model_equivalence(ops in arb_ops()) {
        let sut: CounterMap<String> = CounterMap::new();
        let mut model = Model::new();

        for op in ops {
            match op {
                Op::Set(i, v) => {
                    prop_assert_eq!(sut.set(key(i), v), model.set(key(i), v));
                }
                Op::Put(i, d) => {
                    prop_assert_eq!(sut.put(key(i), d), model.put(key(i), d));
                }
                Op::Increment(i) => {
                    prop_assert_eq!(sut.increment(key(i)), model.put(key(i), 1));
                }
                Op::Decrement(i) => {
                    prop_assert_eq!(sut.decrement(key(i)), model.put(key(i), -1));
                }
                Op::Remove(i) => {
                    prop_assert_eq!(sut.remove(key(i).as_str()), model.remove(&key(i)));
                }
            }
            check_parity(&sut, &model)?;
        }
    }

    #[test]
    fn prop_range_scan_multiset(ops in arb_ops(), lo in -5i64..=5, hi in -5i64..=5) {
        let sut: CounterMap<String> = CounterMap::new();
        let mut model = Model::new();
        for op in ops {
            match op {
                Op::Set(i, v) => { sut.set(key(i), v); model.set(key(i), v); }
                Op::Put(i, d) => { sut.put(key(i), d); model.put(key(i), d); }
                Op::Increment(i) => { sut.increment(key(i)); model.put(key(i), 1); }
                Op::Decrement(i) => { sut.decrement(key(i)); model.put(key(i), -1); }
                Op::Remove(i) => { sut.remove(key(i).as_str()); model.remove(&key(i)); }
            }
        }

        let mut got = sut.reverse_range(lo, hi);
        got.sort();
        prop_assert_eq!(got, expected_range(&model, lo, hi));

        // Inclusive-bound helpers agree with the general scan over the
        // watermark-bounded domain.
        let mut ge = sut.reverse_greater_equal(lo);
        ge.sort();
        prop_assert_eq!(ge, expected_range(&model, lo, model.max));
        let mut le = sut.reverse_less_equal(hi);
        le.sort();
        prop_assert_eq!(le, expected_range(&model, model.min, hi));
    }

    #[test]
    fn prop_batch_sum_complement(ops in arb_ops(), picks in proptest::collection::vec(0usize..POOL, 0..POOL)) {
        let sut: CounterMap<String> = CounterMap::new();
        for op in ops {
            match op {
                Op::Set(i, v) => { sut.set(key(i), v); }
                Op::Put(i, d) => { sut.put(key(i), d); }
                Op::Increment(i) => { sut.increment(key(i)); }
                Op::Decrement(i) => { sut.decrement(key(i)); }
                Op::Remove(i) => { sut.remove(key(i).as_str()); }
            }
        }

        // Duplicate picks would double-count in sum_of; dedupe the subset.
        let mut picks = picks;
        picks.sort_unstable();
        picks.dedup();
        let keys: Vec<String> = picks.into_iter().map(key).collect();
        let refs: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();

        let expected: i64 = refs.iter().filter_map(|k| sut.get(*k)).sum();
        prop_assert_eq!(sut.sum_of(refs.iter().copied()), expected);
        prop_assert_eq!(
            sut.sum_of(refs.iter().copied()) + sut.sum_excluding(refs.iter().copied()),
            sut.sum_value()
        );
    }
}
