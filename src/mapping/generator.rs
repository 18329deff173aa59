/*
Inputs:

    primary concept map (heuristics; decides the partition)

    optional secondary concept map (text retrieval)

Outputs:

    FormalContext: normalized files x (partition pair + concept terms)

    optional per-cell occurrence weights

    OccurrenceMatrix: per-category and per-file counts over the shared concepts

Responsibilities:

    Normalize file paths against the project root

    OR the relation across both maps

    Tag every object with exactly one partition attribute

    Drop rows with no concept attribute when asked, before the context exists
*/
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::core::context::{ContextError, FormalContext};
use crate::core::types::{AttributeId, ConceptTerm, ObjectId, PartitionPair, DB_ROW_PREFIX};
use crate::mapping::location::ConceptLocationMap;
use crate::mapping::normalize::normalize_path;

/// Which concept terms become attribute columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AttributeScope {
    /// Union of the keys of every supplied map.
    #[default]
    All,
    /// Only keys present in both maps (all primary keys when there is no second map).
    Common,
    /// Only keys of the primary map; secondary-only concepts never become columns.
    Primary,
}

/// Context built from concept maps, plus what the table writers need on top of it.
#[derive(Debug, Clone)]
pub struct IncidenceMatrix {
    pub context: FormalContext,
    /// Concept attribute ids, in column order (partition attributes excluded).
    pub concept_columns: Vec<AttributeId>,
    /// Summed occurrence counts; only filled by the occurrence variant.
    pub weights: Option<HashMap<(ObjectId, AttributeId), u64>>,
    pub partition: PartitionPair,
}

impl IncidenceMatrix {
    pub fn is_primary(&self, o: ObjectId) -> bool {
        self.context
            .attribute_id(&self.partition.positive)
            .is_some_and(|pos| self.context.incident(o, pos))
    }

    /// Row label as written in the presence table: primary objects get a `db|` prefix.
    pub fn row_label(&self, o: ObjectId) -> String {
        let file = &self.context.objects()[o];
        if self.is_primary(o) {
            format!("{DB_ROW_PREFIX}{file}")
        } else {
            file.clone()
        }
    }

    pub fn weight(&self, o: ObjectId, a: AttributeId) -> u64 {
        self.weights
            .as_ref()
            .and_then(|w| w.get(&(o, a)).copied())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct IncidenceMatrixBuilder<'a> {
    primary: &'a ConceptLocationMap,
    secondary: Option<&'a ConceptLocationMap>,
    project_root: String,
    scope: AttributeScope,
    drop_empty_rows: bool,
    partition: PartitionPair,
}

impl<'a> IncidenceMatrixBuilder<'a> {
    pub fn new(primary: &'a ConceptLocationMap, project_root: impl Into<String>) -> Self {
        Self {
            primary,
            secondary: None,
            project_root: project_root.into(),
            scope: AttributeScope::All,
            drop_empty_rows: false,
            partition: PartitionPair::default(),
        }
    }

    pub fn with_secondary(mut self, secondary: &'a ConceptLocationMap) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn scope(mut self, scope: AttributeScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn drop_empty_rows(mut self, drop: bool) -> Self {
        self.drop_empty_rows = drop;
        self
    }

    pub fn partition(mut self, partition: PartitionPair) -> Self {
        self.partition = partition;
        self
    }

    fn maps(&self) -> impl Iterator<Item = &'a ConceptLocationMap> {
        std::iter::once(self.primary).chain(self.secondary)
    }

    fn concept_terms(&self) -> BTreeSet<ConceptTerm> {
        let mut terms: BTreeSet<ConceptTerm> = match self.scope {
            AttributeScope::All => self.maps().flat_map(|m| m.concepts().cloned()).collect(),
            AttributeScope::Common => self
                .primary
                .concepts()
                .filter(|c| self.secondary.is_none_or(|s| s.contains_concept(c)))
                .cloned()
                .collect(),
            AttributeScope::Primary => self.primary.concepts().cloned().collect(),
        };
        //a concept spelled like a partition attribute would collide with its column
        terms.retain(|t| !self.partition.contains(t));
        terms
    }

    /// Boolean relation only.
    pub fn build_presence(&self) -> Result<IncidenceMatrix, ContextError> {
        self.build(false)
    }

    /// Boolean relation plus summed occurrence counts per (file, concept), taken from the
    /// secondary map when one is set.
    pub fn build_occurrence(&self) -> Result<IncidenceMatrix, ContextError> {
        self.build(true)
    }

    fn build(&self, with_weights: bool) -> Result<IncidenceMatrix, ContextError> {
        let root = self.project_root.as_str();
        let terms = self.concept_terms();

        //counts come from the token-scan map when there is one
        let counted = usize::from(self.secondary.is_some());

        //file -> concept -> summed count, OR-ed across maps
        let mut relation: BTreeMap<String, BTreeMap<&str, u64>> = BTreeMap::new();
        for (i, map) in self.maps().enumerate() {
            for (concept, file, count) in map.iter() {
                let file = normalize_path(file, root);
                let row = relation.entry(file).or_default();
                if let Some(term) = terms.get(concept.as_str()) {
                    let count = if i == counted { count.unwrap_or(0) } else { 0 };
                    let cell = row.entry(term.as_str()).or_insert(0);
                    *cell = cell.saturating_add(count);
                }
            }
        }

        let primary_files = self.primary.all_normalized_files(root);

        let before = relation.len();
        if self.drop_empty_rows {
            relation.retain(|_, concepts| !concepts.is_empty());
        }
        if relation.len() != before {
            debug!(dropped = before - relation.len(), "objects without concept attributes dropped");
        }

        let mut attributes = vec![self.partition.positive.clone(), self.partition.negative.clone()];
        attributes.extend(terms.iter().cloned());
        let column_of: HashMap<&str, AttributeId> = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i + 2))
            .collect();

        let mut incidence = Vec::new();
        let mut weights = HashMap::new();
        let objects: Vec<String> = relation.keys().cloned().collect();
        for (o, (file, concepts)) in relation.iter().enumerate() {
            let side = if primary_files.contains(file) { 0 } else { 1 };
            incidence.push((o, side));
            for (term, count) in concepts {
                let a = column_of[term];
                incidence.push((o, a));
                if with_weights && *count > 0 {
                    weights.insert((o, a), *count);
                }
            }
        }

        let context = FormalContext::new(objects, attributes, incidence)?.with_partition(&self.partition)?;
        debug!(
            objects = context.object_count(),
            attributes = context.attribute_count(),
            "incidence matrix built"
        );

        Ok(IncidenceMatrix {
            concept_columns: (2..context.attribute_count()).collect(),
            context,
            weights: with_weights.then_some(weights),
            partition: self.partition.clone(),
        })
    }
}

pub const DB_CATEGORY: &str = "DB Files";
pub const NON_DB_CATEGORY: &str = "Non-DB Files";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceRow {
    pub label: String,
    pub counts: Vec<u64>,
}

/// Occurrence counts aggregated per partition side and listed per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceMatrix {
    pub concepts: Vec<ConceptTerm>,
    /// `DB Files` / `Non-DB Files` totals; categories with no occurrence are omitted.
    pub categories: Vec<OccurrenceRow>,
    /// Per-file rows, primary (db) files first, files with no occurrence omitted.
    pub files: Vec<OccurrenceRow>,
}

impl OccurrenceMatrix {
    pub fn from_incidence(matrix: &IncidenceMatrix) -> Self {
        let ctx = &matrix.context;
        let concepts: Vec<ConceptTerm> = matrix
            .concept_columns
            .iter()
            .map(|&a| ctx.attributes()[a].clone())
            .collect();

        let mut db_totals = vec![0u64; concepts.len()];
        let mut other_totals = vec![0u64; concepts.len()];
        let mut db_rows = Vec::new();
        let mut other_rows = Vec::new();

        for o in 0..ctx.object_count() {
            let counts: Vec<u64> = matrix.concept_columns.iter().map(|&a| matrix.weight(o, a)).collect();
            let primary = matrix.is_primary(o);
            let totals = if primary { &mut db_totals } else { &mut other_totals };
            for (t, c) in totals.iter_mut().zip(&counts) {
                *t = t.saturating_add(*c);
            }
            if counts.iter().any(|&c| c > 0) {
                let row = OccurrenceRow {
                    label: matrix.row_label(o),
                    counts,
                };
                if primary { db_rows.push(row) } else { other_rows.push(row) }
            }
        }

        let categories = [(DB_CATEGORY, db_totals), (NON_DB_CATEGORY, other_totals)]
            .into_iter()
            .filter(|(_, totals)| totals.iter().any(|&c| c > 0))
            .map(|(label, counts)| OccurrenceRow {
                label: label.to_string(),
                counts,
            })
            .collect();

        db_rows.extend(other_rows);
        Self {
            concepts,
            categories,
            files: db_rows,
        }
    }
}
