/*
Concept-location extraction from the two raw traces.

Structural (heuristics) trace: a list of root nodes shaped like

    { "concepts": [{"name": "order history", ...}], "location": "...",
      "technology": {"id": "..."},
      "directories": [...], "files": [...], "codeFragments": [...] }

Text-retrieval trace: a list of groups, each a list of per-file records

    { "file": "...", "tokens": [{"concept": "order", "nbOccurence": 3}] }

A malformed node or token only loses its own contribution; a trace whose top level is
not a list is rejected.
*/
use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::types::{split_concept_name, ConceptTerm};
use crate::mapping::location::{ConceptLocationMap, Location};
use crate::mapping::normalize::normalize_path;

//child collections of a structural node, visited in this order
const CHILD_KEYS: [&str; 3] = ["directories", "files", "codeFragments"];

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("{trace} trace must be a JSON list at the top level, found {found}")]
    NotAList { trace: &'static str, found: &'static str },
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

pub trait ConceptExtractor {
    /// One pass over the trace producing the full concept -> locations map.
    fn extract_map(&self, trace: &Value) -> Result<ConceptLocationMap, TraceError>;

    fn extract_all_concepts(&self, trace: &Value) -> Result<BTreeSet<ConceptTerm>, TraceError> {
        Ok(self.extract_map(trace)?.concept_set())
    }

    fn extract_locations(&self, trace: &Value, concept: &str) -> Result<BTreeSet<Location>, TraceError> {
        Ok(self.extract_map(trace)?.locations(concept))
    }
}

/// Skips nodes whose technology tag matches an excluded framework (e.g. `express`
/// routing code), keeping only nodes that declare some other technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnologyFilter {
    pub excluded: String,
}

impl TechnologyFilter {
    pub fn new(excluded: impl Into<String>) -> Self {
        Self {
            excluded: excluded.into(),
        }
    }

    //untagged nodes are rejected too: only tagged, non-excluded technology counts
    pub fn admits(&self, node: &Value) -> bool {
        node.get("technology")
            .and_then(|t| t.get("id"))
            .and_then(Value::as_str)
            .is_some_and(|id| !id.contains(self.excluded.as_str()))
    }
}

/// Depth-first walk over the project tree of the heuristics trace.
#[derive(Debug, Clone)]
pub struct StructuralExtractor {
    project_root: String,
    technology_filter: Option<TechnologyFilter>,
    count_occurrences: bool,
}

impl StructuralExtractor {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            technology_filter: None,
            count_occurrences: false,
        }
    }

    pub fn with_technology_filter(mut self, filter: Option<TechnologyFilter>) -> Self {
        self.technology_filter = filter;
        self
    }

    /// Record how many annotations of a node mention each token.
    pub fn with_occurrence_counts(mut self, on: bool) -> Self {
        self.count_occurrences = on;
        self
    }

    //fold step: add one node's own annotations to the accumulator
    fn visit(&self, node: &Value, mut acc: ConceptLocationMap) -> ConceptLocationMap {
        let Some(annotations) = node.get("concepts") else {
            return acc;
        };
        if let Some(filter) = &self.technology_filter {
            if !filter.admits(node) {
                debug!(excluded = %filter.excluded, "node skipped by technology filter");
                return acc;
            }
        }
        let Some(annotations) = annotations.as_array() else {
            warn!(found = kind_of(annotations), "`concepts` is not a list, node skipped");
            return acc;
        };
        let Some(raw_location) = node.get("location").and_then(Value::as_str) else {
            warn!("node with concepts but no string `location`, node skipped");
            return acc;
        };
        let file = normalize_path(raw_location, &self.project_root);

        for item in annotations {
            let Some(name) = item.get("name").and_then(Value::as_str) else {
                warn!(location = %file, "concept annotation without a string `name` skipped");
                continue;
            };
            for token in split_concept_name(name) {
                let count = self.count_occurrences.then_some(1);
                acc.record(token, file.clone(), count);
            }
        }
        acc
    }
}

impl ConceptExtractor for StructuralExtractor {
    fn extract_map(&self, trace: &Value) -> Result<ConceptLocationMap, TraceError> {
        let roots = trace.as_array().ok_or(TraceError::NotAList {
            trace: "heuristics",
            found: kind_of(trace),
        })?;

        //explicit stack instead of recursion: trees can be arbitrarily deep
        let mut stack: Vec<&Value> = roots.iter().rev().collect();
        let mut acc = ConceptLocationMap::new();
        let mut visited = 0usize;

        while let Some(node) = stack.pop() {
            visited += 1;
            if !node.is_object() {
                warn!(found = kind_of(node), "non-object node in heuristics trace skipped");
                continue;
            }
            acc = self.visit(node, acc);

            //push in reverse so children are visited in document order
            for key in CHILD_KEYS.iter().rev() {
                if let Some(children) = node.get(*key).and_then(Value::as_array) {
                    stack.extend(children.iter().rev());
                }
            }
        }

        debug!(nodes = visited, concepts = acc.len(), "heuristics trace walked");
        Ok(acc)
    }
}

/// Single pass over the per-file token lists of the text-retrieval trace.
#[derive(Debug, Clone)]
pub struct TokenScanExtractor {
    project_root: String,
}

impl TokenScanExtractor {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    fn visit_file(&self, record: &Value, mut acc: ConceptLocationMap) -> ConceptLocationMap {
        let Some(raw_file) = record.get("file").and_then(Value::as_str) else {
            warn!("text-retrieval record without a string `file` skipped");
            return acc;
        };
        let Some(tokens) = record.get("tokens").and_then(Value::as_array) else {
            warn!(file = raw_file, "text-retrieval record without a `tokens` list skipped");
            return acc;
        };
        let file = normalize_path(raw_file, &self.project_root);

        for token in tokens {
            let concept = token.get("concept").and_then(Value::as_str);
            let count = token.get("nbOccurence").and_then(Value::as_u64);
            let (Some(concept), Some(count)) = (concept, count) else {
                warn!(file = %file, "token without `concept` or `nbOccurence` skipped");
                continue;
            };
            for term in split_concept_name(concept) {
                acc.record(term, file.clone(), Some(count));
            }
        }
        acc
    }
}

impl ConceptExtractor for TokenScanExtractor {
    fn extract_map(&self, trace: &Value) -> Result<ConceptLocationMap, TraceError> {
        let groups = trace.as_array().ok_or(TraceError::NotAList {
            trace: "text-retrieval",
            found: kind_of(trace),
        })?;

        //groups are normally lists of records; a bare record at top level is accepted too
        let records = groups.iter().flat_map(|g| match g {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        });

        let acc = records.fold(ConceptLocationMap::new(), |acc, r| self.visit_file(r, acc));
        debug!(concepts = acc.len(), "text-retrieval trace scanned");
        Ok(acc)
    }
}
