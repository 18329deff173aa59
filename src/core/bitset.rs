// fixed-universe bitset used for extents and intents
use std::fmt;

const WORD_BITS: usize = 64;

/// A set of indices drawn from `0..universe`.
///
/// Extents are sets over object ids and intents are sets over attribute ids, so every
/// set carries the size of the universe it lives in. Binary operations expect both
/// operands to share the same universe.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    words: Vec<u64>,
    universe: usize,
}

impl BitSet {
    pub fn empty(universe: usize) -> Self {
        Self {
            words: vec![0; universe.div_ceil(WORD_BITS)],
            universe,
        }
    }

    pub fn full(universe: usize) -> Self {
        let mut set = Self::empty(universe);
        for i in 0..universe {
            set.insert(i);
        }
        set
    }

    pub fn from_indices(universe: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::empty(universe);
        for i in indices {
            set.insert(i);
        }
        set
    }

    pub fn universe(&self) -> usize {
        self.universe
    }

    //out of range indices are ignored so callers never have to pre-check
    pub fn insert(&mut self, i: usize) {
        if i < self.universe {
            self.words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
        }
    }

    pub fn remove(&mut self, i: usize) {
        if i < self.universe {
            self.words[i / WORD_BITS] &= !(1u64 << (i % WORD_BITS));
        }
    }

    pub fn contains(&self, i: usize) -> bool {
        i < self.universe && self.words[i / WORD_BITS] & (1u64 << (i % WORD_BITS)) != 0
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.universe
    }

    pub fn is_subset(&self, other: &BitSet) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & !b == 0)
    }

    pub fn is_proper_subset(&self, other: &BitSet) -> bool {
        self.is_subset(other) && self != other
    }

    pub fn intersect_with(&mut self, other: &BitSet) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= b;
        }
    }

    pub fn union_with(&mut self, other: &BitSet) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= b;
        }
    }

    pub fn difference_with(&mut self, other: &BitSet) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= !b;
        }
    }

    pub fn intersection(&self, other: &BitSet) -> BitSet {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    pub fn union(&self, other: &BitSet) -> BitSet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    pub fn difference(&self, other: &BitSet) -> BitSet {
        let mut out = self.clone();
        out.difference_with(other);
        out
    }

    /// True when both sets hold exactly the same members below `bound`.
    pub fn agrees_below(&self, other: &BitSet, bound: usize) -> bool {
        let full_words = bound / WORD_BITS;
        if self.words[..full_words] != other.words[..full_words] {
            return false;
        }
        let rest = bound % WORD_BITS;
        if rest == 0 {
            return true;
        }
        let mask = (1u64 << rest) - 1;
        self.words[full_words] & mask == other.words[full_words] & mask
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.universe).filter(move |&i| self.contains(i))
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_contains_across_word_boundary() {
        let mut s = BitSet::empty(130);
        s.insert(0);
        s.insert(63);
        s.insert(64);
        s.insert(129);
        s.insert(500); //ignored

        assert!(s.contains(63));
        assert!(s.contains(64));
        assert!(s.contains(129));
        assert!(!s.contains(500));
        assert_eq!(s.len(), 4);

        s.remove(64);
        assert!(!s.contains(64));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![0, 63, 129]);
    }

    #[test]
    fn subset_and_set_algebra() {
        let a = BitSet::from_indices(10, [1, 3]);
        let b = BitSet::from_indices(10, [1, 3, 7]);

        assert!(a.is_subset(&b));
        assert!(a.is_proper_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(!a.is_proper_subset(&a));

        assert_eq!(a.union(&b), b);
        assert_eq!(a.intersection(&b), a);
        assert_eq!(b.difference(&a).iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn agrees_below_only_looks_at_prefix() {
        let a = BitSet::from_indices(70, [2, 65, 69]);
        let b = BitSet::from_indices(70, [2, 65, 68]);

        assert!(a.agrees_below(&b, 0));
        assert!(a.agrees_below(&b, 68));
        assert!(!a.agrees_below(&b, 69));
        assert!(!a.agrees_below(&b, 70));
    }

    #[test]
    fn full_and_empty_universe() {
        assert!(BitSet::full(5).is_full());
        assert!(BitSet::empty(0).is_empty());
        assert!(BitSet::empty(0).is_full());
        assert_eq!(BitSet::full(0), BitSet::empty(0));
    }
}
