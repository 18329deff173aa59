pub mod bitset;
pub mod closure;
pub mod context;
pub mod lattice;
pub mod prune;
#[cfg(test)]
pub(crate) mod strategy;
pub mod types;

pub use bitset::BitSet;
pub use context::{ContextError, FormalContext};
pub use lattice::{
    build_lattice, ConceptLattice, ConceptLatticeBuilder, FormalConcept, LatticeBuild, LatticeLimits,
};
pub use prune::{LatticePruner, PrunedLattice};
