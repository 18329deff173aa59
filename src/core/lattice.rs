// concept lattice: enumeration + covering order
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::core::bitset::BitSet;
use crate::core::closure::LecticIntents;
use crate::core::context::FormalContext;
use crate::core::types::ConceptId;

/// A closed (extent, intent) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalConcept {
    pub extent: BitSet,
    pub intent: BitSet,
}

impl FormalConcept {
    /// Order of the lattice: self <= other iff extent(self) ⊆ extent(other).
    pub fn le(&self, other: &FormalConcept) -> bool {
        self.extent.is_subset(&other.extent)
    }
}

/// All formal concepts of a context and their Hasse diagram.
///
/// Concepts are stored in the lectic order of their intents, so id 0 is always the
/// top concept when the lattice is not empty. `parents[c]` are the concepts that
/// cover `c` (immediate successors, larger extent), `children[c]` the concepts `c`
/// covers.
#[derive(Debug, Clone)]
pub struct ConceptLattice {
    concepts: Vec<FormalConcept>,
    parents: Vec<Vec<ConceptId>>,
    children: Vec<Vec<ConceptId>>,
    by_intent: HashMap<BitSet, ConceptId>,
    by_extent: HashMap<BitSet, ConceptId>,
    top: Option<ConceptId>,
    bottom: Option<ConceptId>,
}

impl ConceptLattice {
    fn from_concepts(concepts: Vec<FormalConcept>, attribute_count: usize) -> Self {
        let (parents, children) = covering_relation(&concepts);

        let by_intent: HashMap<BitSet, ConceptId> = concepts
            .iter()
            .enumerate()
            .map(|(id, c)| (c.intent.clone(), id))
            .collect();
        let by_extent: HashMap<BitSet, ConceptId> = concepts
            .iter()
            .enumerate()
            .map(|(id, c)| (c.extent.clone(), id))
            .collect();

        //lectic enumeration always starts at closure(∅), the top; a partial one may miss bottom
        let top = (!concepts.is_empty()).then_some(0);
        let bottom = by_intent.get(&BitSet::full(attribute_count)).copied();

        Self {
            concepts,
            parents,
            children,
            by_intent,
            by_extent,
            top,
            bottom,
        }
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn concepts(&self) -> &[FormalConcept] {
        &self.concepts
    }

    pub fn concept(&self, id: ConceptId) -> Option<&FormalConcept> {
        self.concepts.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConceptId, &FormalConcept)> {
        self.concepts.iter().enumerate()
    }

    pub fn top(&self) -> Option<ConceptId> {
        self.top
    }

    pub fn bottom(&self) -> Option<ConceptId> {
        self.bottom
    }

    /// Concepts immediately above `id`.
    pub fn parents(&self, id: ConceptId) -> &[ConceptId] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Concepts immediately below `id`.
    pub fn children(&self, id: ConceptId) -> &[ConceptId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every covering pair as (lower, upper).
    pub fn cover_edges(&self) -> impl Iterator<Item = (ConceptId, ConceptId)> + '_ {
        self.parents
            .iter()
            .enumerate()
            .flat_map(|(lower, ups)| ups.iter().map(move |&upper| (lower, upper)))
    }

    pub fn find_by_intent(&self, intent: &BitSet) -> Option<ConceptId> {
        self.by_intent.get(intent).copied()
    }

    pub fn find_by_extent(&self, extent: &BitSet) -> Option<ConceptId> {
        self.by_extent.get(extent).copied()
    }

    /// Least upper bound: the concept whose intent is the intersection of both intents.
    pub fn join(&self, a: ConceptId, b: ConceptId) -> Option<ConceptId> {
        let (ca, cb) = (self.concept(a)?, self.concept(b)?);
        self.find_by_intent(&ca.intent.intersection(&cb.intent))
    }

    /// Greatest lower bound: the concept whose extent is the intersection of both extents.
    pub fn meet(&self, a: ConceptId, b: ConceptId) -> Option<ConceptId> {
        let (ca, cb) = (self.concept(a)?, self.concept(b)?);
        self.find_by_extent(&ca.extent.intersection(&cb.extent))
    }
}

/// Upper covers per concept, and the inverse lower covers.
///
/// For a concept `c`, its covers are the minimal elements (under extent inclusion)
/// among the concepts with a strictly larger extent. Candidates are visited by
/// increasing extent size, so a candidate is minimal exactly when no already accepted
/// cover sits below it.
fn covering_relation(concepts: &[FormalConcept]) -> (Vec<Vec<ConceptId>>, Vec<Vec<ConceptId>>) {
    let mut order: Vec<ConceptId> = (0..concepts.len()).collect();
    order.sort_by_key(|&id| concepts[id].extent.len());

    let mut parents = vec![Vec::new(); concepts.len()];
    let mut children = vec![Vec::new(); concepts.len()];

    for (id, c) in concepts.iter().enumerate() {
        let mut covers: Vec<ConceptId> = Vec::new();
        for &cand in &order {
            let up = &concepts[cand];
            if !c.extent.is_proper_subset(&up.extent) {
                continue;
            }
            let blocked = covers
                .iter()
                .any(|&p| concepts[p].extent.is_proper_subset(&up.extent));
            if !blocked {
                covers.push(cand);
            }
        }
        for &p in &covers {
            children[p].push(id);
        }
        parents[id] = covers;
    }

    for list in parents.iter_mut().chain(children.iter_mut()) {
        list.sort_unstable();
    }
    (parents, children)
}

/// Result of an enumeration that may have hit the concept ceiling.
#[derive(Debug, Clone)]
pub enum LatticeBuild {
    Complete(ConceptLattice),
    /// Enumeration stopped after `limit` concepts; the lattice holds only those and its
    /// covering order is computed among them.
    Partial { lattice: ConceptLattice, limit: usize },
}

impl LatticeBuild {
    pub fn is_complete(&self) -> bool {
        matches!(self, LatticeBuild::Complete(_))
    }

    pub fn lattice(&self) -> &ConceptLattice {
        match self {
            LatticeBuild::Complete(l) => l,
            LatticeBuild::Partial { lattice, .. } => lattice,
        }
    }

    pub fn into_lattice(self) -> ConceptLattice {
        match self {
            LatticeBuild::Complete(l) => l,
            LatticeBuild::Partial { lattice, .. } => lattice,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatticeLimits {
    pub max_concepts: Option<usize>,
}

/// Enumerates all formal concepts of a context with NextClosure and derives covers.
///
/// The number of concepts can be exponential in min(|objects|, |attributes|) for dense
/// or combinatorially rich contexts; set `max_concepts` to stop early, or restrict the
/// context first (`FormalContext::restrict`).
#[derive(Debug, Clone, Default)]
pub struct ConceptLatticeBuilder {
    limits: LatticeLimits,
}

impl ConceptLatticeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: LatticeLimits) -> Self {
        Self { limits }
    }

    pub fn max_concepts(mut self, max: usize) -> Self {
        self.limits.max_concepts = Some(max);
        self
    }

    pub fn build(&self, ctx: &FormalContext) -> LatticeBuild {
        let mut concepts = Vec::new();
        let mut intents = LecticIntents::new(ctx);
        let mut truncated = false;

        loop {
            if let Some(max) = self.limits.max_concepts {
                if concepts.len() >= max {
                    truncated = true;
                    break;
                }
            }
            let Some(intent) = intents.next() else { break };
            let extent = ctx.derive_objects(&intent);
            debug!(extent = extent.len(), intent = intent.len(), "closed concept");
            concepts.push(FormalConcept { extent, intent });
        }

        //reaching the ceiling exactly on the last closed set is still complete
        if truncated && intents.next().is_none() {
            truncated = false;
        }

        let lattice = ConceptLattice::from_concepts(concepts, ctx.attribute_count());

        if truncated {
            let limit = lattice.len();
            warn!(limit, "concept ceiling reached, lattice is partial");
            LatticeBuild::Partial { lattice, limit }
        } else {
            info!(
                concepts = lattice.len(),
                objects = ctx.object_count(),
                attributes = ctx.attribute_count(),
                "concept lattice built"
            );
            LatticeBuild::Complete(lattice)
        }
    }
}

/// Unbounded enumeration.
pub fn build_lattice(ctx: &FormalContext) -> ConceptLattice {
    ConceptLatticeBuilder::new().build(ctx).into_lattice()
}
