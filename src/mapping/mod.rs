pub mod extract;
pub mod generator;
pub mod location;
pub mod normalize;
pub mod reconcile;

pub use extract::{ConceptExtractor, StructuralExtractor, TechnologyFilter, TokenScanExtractor, TraceError};
pub use generator::{AttributeScope, IncidenceMatrix, IncidenceMatrixBuilder, OccurrenceMatrix, OccurrenceRow};
pub use location::{ConceptLocationMap, Location};
pub use normalize::normalize_path;
pub use reconcile::{reconcile, LocationDiff, Reconciliation};
