/*
Closed attribute sets in lectic order (Ganter's NextClosure).

Attributes are ordered by their id. For a closed set A and an attribute i not in A:

    A (+) i = closure((A ∩ {0..i-1}) ∪ {i})

The lectic successor of A is A (+) i for the largest i such that A (+) i adds no
attribute smaller than i. Every closed set is produced exactly once, smallest first,
starting from closure(∅) and ending with the full attribute set.
*/
use crate::core::bitset::BitSet;
use crate::core::context::FormalContext;

/// The lectic successor of the closed intent `current`, or `None` when `current` is the
/// last closed set (the full attribute set).
pub fn next_closure(ctx: &FormalContext, current: &BitSet) -> Option<BitSet> {
    //prefix holds current ∩ {0..i-1} when looking at attribute i
    let mut prefix = current.clone();

    for i in (0..ctx.attribute_count()).rev() {
        if prefix.contains(i) {
            prefix.remove(i);
            continue;
        }

        let mut candidate = prefix.clone();
        candidate.insert(i);
        let closed = ctx.closure(&candidate);

        if closed.agrees_below(&prefix, i) {
            return Some(closed);
        }
    }
    None
}

/// Iterator over every closed intent of a context, in lectic order.
pub struct LecticIntents<'a> {
    ctx: &'a FormalContext,
    next: Option<BitSet>,
}

impl<'a> LecticIntents<'a> {
    pub fn new(ctx: &'a FormalContext) -> Self {
        let first = ctx.closure(&BitSet::empty(ctx.attribute_count()));
        Self {
            ctx,
            next: Some(first),
        }
    }
}

impl Iterator for LecticIntents<'_> {
    type Item = BitSet;

    fn next(&mut self) -> Option<BitSet> {
        let current = self.next.take()?;
        self.next = next_closure(self.ctx, &current);
        Some(current)
    }
}
