//! Property-test generators for formal contexts and brute-force oracles to check the
//! engine against. Only compiled for tests.

use proptest::prelude::*;

use crate::core::bitset::BitSet;
use crate::core::context::FormalContext;

/// Random context with up to `max_objects` x `max_attributes` cells, each set with
/// probability one half.
pub fn gen_context(max_objects: usize, max_attributes: usize) -> impl Strategy<Value = FormalContext> {
    (0..=max_objects, 0..=max_attributes).prop_flat_map(|(n, m)| {
        proptest::collection::vec(proptest::collection::vec(any::<bool>(), m), n).prop_map(move |rows| {
            let objects = (0..n).map(|i| format!("o{i}")).collect();
            let attributes = (0..m).map(|j| format!("a{j}")).collect();
            let incidence: Vec<(usize, usize)> = rows
                .iter()
                .enumerate()
                .flat_map(|(o, row)| row.iter().enumerate().filter(|(_, set)| **set).map(move |(a, _)| (o, a)))
                .collect();
            FormalContext::new(objects, attributes, incidence).unwrap()
        })
    })
}

/// Every subset of `{0, .., n-1}`.
pub fn all_subsets(n: usize) -> Vec<BitSet> {
    (0..(1usize << n))
        .map(|mask| BitSet::from_indices(n, (0..n).filter(|i| mask & (1 << i) != 0)))
        .collect()
}

/// Closed attribute sets found by closing every subset.
pub fn brute_force_intents(ctx: &FormalContext) -> Vec<BitSet> {
    let mut intents: Vec<BitSet> = all_subsets(ctx.attribute_count())
        .iter()
        .map(|f| ctx.closure(f))
        .collect();
    intents.sort_by_key(|b| b.iter().collect::<Vec<_>>());
    intents.dedup();
    intents
}
