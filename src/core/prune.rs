/*
Coloring-noise pruning.

A concept whose intent, once the two partition ("coloring") attributes are taken out,
is just the top intent says nothing more than "these are the files of one color". The
pruner hides such concepts. It is a display filter, not a re-lattice operation:

    - the source lattice is left untouched, the result is a view over it
    - top and bottom are always kept
    - cover edges touching a hidden concept are dropped, not repaired, so the view's
      edges are the source covers restricted to surviving concepts
*/
use crate::core::bitset::BitSet;
use crate::core::context::FormalContext;
use crate::core::lattice::{ConceptLattice, FormalConcept};
use crate::core::types::ConceptId;

/// Surviving concepts of a pruned lattice, with the restricted covering pairs.
#[derive(Debug, Clone)]
pub struct PrunedLattice<'a> {
    source: &'a ConceptLattice,
    kept: Vec<ConceptId>,
    removed: Vec<ConceptId>,
    edges: Vec<(ConceptId, ConceptId)>,
}

impl<'a> PrunedLattice<'a> {
    pub fn source(&self) -> &'a ConceptLattice {
        self.source
    }

    /// Ids (in the source lattice) of the concepts that survive.
    pub fn kept(&self) -> &[ConceptId] {
        &self.kept
    }

    pub fn removed(&self) -> &[ConceptId] {
        &self.removed
    }

    pub fn contains(&self, id: ConceptId) -> bool {
        self.kept.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    pub fn concepts(&self) -> impl Iterator<Item = (ConceptId, &'a FormalConcept)> + '_ {
        let source = self.source;
        self.kept
            .iter()
            .filter_map(move |&id| source.concept(id).map(|c| (id, c)))
    }

    /// Source cover pairs (lower, upper) whose endpoints both survive.
    pub fn edges(&self) -> &[(ConceptId, ConceptId)] {
        &self.edges
    }

    /// Surviving upper covers of `id`.
    pub fn parents(&self, id: ConceptId) -> Vec<ConceptId> {
        self.edges
            .iter()
            .filter(|(lower, _)| *lower == id)
            .map(|&(_, upper)| upper)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LatticePruner {
    coloring: BitSet,
}

impl LatticePruner {
    pub fn new(coloring: BitSet) -> Self {
        Self { coloring }
    }

    /// Pruner for the partition pair declared on the context (no-op set if none).
    pub fn for_context(ctx: &FormalContext) -> Self {
        Self::new(ctx.coloring_attributes())
    }

    pub fn is_coloring_noise(&self, concept: &FormalConcept, top: &FormalConcept) -> bool {
        concept.intent.difference(&self.coloring) == top.intent
    }

    pub fn prune<'a>(&self, lattice: &'a ConceptLattice) -> PrunedLattice<'a> {
        let top = lattice.top();
        let bottom = lattice.bottom();
        let top_concept = top.and_then(|t| lattice.concept(t));

        let mut kept = Vec::with_capacity(lattice.len());
        let mut removed = Vec::new();
        for (id, c) in lattice.iter() {
            let protected = Some(id) == top || Some(id) == bottom || c.intent.is_empty();
            let noise = top_concept.is_some_and(|t| self.is_coloring_noise(c, t));
            if !protected && noise {
                removed.push(id);
            } else {
                kept.push(id);
            }
        }

        let edges = lattice
            .cover_edges()
            .filter(|(lower, upper)| kept.binary_search(lower).is_ok() && kept.binary_search(upper).is_ok())
            .collect();

        PrunedLattice {
            source: lattice,
            kept,
            removed,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::build_lattice;
    use crate::core::types::PartitionPair;

    fn mk_colored(objects: &[&str], attributes: &[&str], pairs: &[(&str, &str)]) -> FormalContext {
        FormalContext::from_labeled(objects, attributes, pairs)
            .unwrap()
            .with_partition(&PartitionPair::default())
            .unwrap()
    }

    #[test]
    fn keeps_mid_level_concepts_of_shop_example() {
        // f1, f3 are db files; every pair of files shares a concept term
        let k = mk_colored(
            &["f1", "f2", "f3"],
            &["is_db_file", "is_not_db_file", "db", "cart", "ship"],
            &[
                ("f1", "is_db_file"),
                ("f1", "db"),
                ("f1", "cart"),
                ("f2", "is_not_db_file"),
                ("f2", "cart"),
                ("f2", "ship"),
                ("f3", "is_db_file"),
                ("f3", "db"),
                ("f3", "ship"),
            ],
        );
        let l = build_lattice(&k);
        let pruned = LatticePruner::for_context(&k).prune(&l);

        for attr in ["cart", "ship"] {
            let id = l.find_by_intent(&k.attribute_set(&[attr]).unwrap()).unwrap();
            assert!(pruned.contains(id), "{attr} concept must survive");
        }
        // {f1, f3} are exactly the db files, the concept intent is {is_db_file, db}
        let db = l
            .find_by_intent(&k.attribute_set(&["is_db_file", "db"]).unwrap())
            .unwrap();
        assert!(pruned.contains(db));
        assert!(pruned.removed().is_empty());
    }

    #[test]
    fn removes_concept_that_only_carries_a_color() {
        // a and b are db files sharing no concept term: ({a,b}, {is_db_file}) is noise
        let k = mk_colored(
            &["a", "b", "c"],
            &["is_db_file", "is_not_db_file", "x", "y"],
            &[
                ("a", "is_db_file"),
                ("a", "x"),
                ("b", "is_db_file"),
                ("b", "y"),
                ("c", "is_not_db_file"),
                ("c", "x"),
            ],
        );
        let l = build_lattice(&k);
        let noise = l.find_by_intent(&k.attribute_set(&["is_db_file"]).unwrap()).unwrap();

        let pruned = LatticePruner::for_context(&k).prune(&l);
        assert_eq!(pruned.removed(), &[noise]);
        assert!(!pruned.contains(noise));
        assert!(pruned.contains(l.top().unwrap()));
        assert!(pruned.contains(l.bottom().unwrap()));

        // source lattice untouched, edges touching the noise concept are gone
        assert!(l.concept(noise).is_some());
        assert!(pruned.edges().iter().all(|&(lo, up)| lo != noise && up != noise));
        assert_eq!(pruned.len() + 1, l.len());
    }

    #[test]
    fn never_removes_top_or_bottom() {
        // everything shares `x`, so top intent is {x}; a single db file makes bottom tiny
        let k = mk_colored(
            &["a"],
            &["is_db_file", "is_not_db_file", "x"],
            &[("a", "is_db_file"), ("a", "x")],
        );
        let l = build_lattice(&k);
        let pruned = LatticePruner::for_context(&k).prune(&l);
        assert!(pruned.contains(l.top().unwrap()));
        assert!(pruned.contains(l.bottom().unwrap()));
    }

    #[test]
    fn edges_are_restricted_not_repaired() {
        let k = mk_colored(
            &["a", "b", "c"],
            &["is_db_file", "is_not_db_file", "x", "y"],
            &[
                ("a", "is_db_file"),
                ("a", "x"),
                ("b", "is_db_file"),
                ("b", "y"),
                ("c", "is_not_db_file"),
                ("c", "x"),
            ],
        );
        let l = build_lattice(&k);
        let noise = l.find_by_intent(&k.attribute_set(&["is_db_file"]).unwrap()).unwrap();
        let pruned = LatticePruner::for_context(&k).prune(&l);

        // children of the noise concept lost their edge to it and gained nothing
        for &child in l.children(noise) {
            let before: Vec<_> = l.parents(child).iter().copied().filter(|&p| p != noise).collect();
            assert_eq!(pruned.parents(child), before);
        }
    }
}
