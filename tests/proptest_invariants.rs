//! Property tests for the quantified invariants in the set's testable
//! properties: round-trip add/contains/remove, ordered iteration, and
//! cardinality under arbitrary sequences of operations.

use proptest::prelude::*;
use skipset::{Ascending, SkipSet};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
enum Op {
    Add(i32),
    Remove(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::Add),
        any::<i32>().prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn add_then_contains_then_second_add_then_remove(v in any::<i32>()) {
        let set: SkipSet<i32, Ascending> = SkipSet::new();
        prop_assert!(set.add(v));
        prop_assert!(set.contains(&v));
        prop_assert!(!set.add(v));
        prop_assert!(set.remove(&v));
        prop_assert!(!set.contains(&v));
        prop_assert!(!set.remove(&v));
    }
}

proptest! {
    #[test]
    fn sequence_of_ops_matches_a_btreeset_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let set: SkipSet<i32, Ascending> = SkipSet::new();
        let mut model: BTreeSet<i32> = BTreeSet::new();

        for op in &ops {
            match *op {
                Op::Add(v) => {
                    let inserted_model = model.insert(v);
                    let inserted_set = set.add(v);
                    prop_assert_eq!(inserted_model, inserted_set);
                }
                Op::Remove(v) => {
                    let removed_model = model.remove(&v);
                    let removed_set = set.remove(&v);
                    prop_assert_eq!(removed_model, removed_set);
                }
            }
        }

        prop_assert_eq!(model.len() as i64, set.len());

        let mut collected = Vec::new();
        set.range(|v| {
            collected.push(*v);
            true
        });
        let expected: Vec<i32> = model.into_iter().collect();
        prop_assert_eq!(collected, expected);
    }
}

proptest! {
    #[test]
    fn range_from_matches_a_suffix_of_the_model(
        values in prop::collection::vec(any::<i32>(), 0..100),
        start in any::<i32>(),
    ) {
        let set: SkipSet<i32, Ascending> = SkipSet::new();
        let mut model: BTreeSet<i32> = BTreeSet::new();
        for v in values {
            model.insert(v);
            set.add(v);
        }

        let mut collected = Vec::new();
        set.range_from(&start, |v| {
            collected.push(*v);
            true
        });

        let expected: Vec<i32> = model.range(start..).copied().collect();
        prop_assert_eq!(collected, expected);
    }
}
