// concept -> locations map produced by one extraction run
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::ConceptTerm;
use crate::mapping::normalize::normalize_path;

/// One file associated with a concept, as written to / read from the concept maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "sourceFile")]
    pub source_file: String,
    #[serde(rename = "nbOccurence", default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u64>,
}

impl Location {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            occurrences: None,
        }
    }

    pub fn with_occurrences(source_file: impl Into<String>, occurrences: u64) -> Self {
        Self {
            source_file: source_file.into(),
            occurrences: Some(occurrences),
        }
    }
}

/// Concept term -> files where it occurs, with optional occurrence counts.
///
/// Set semantics per (concept, file): recording the same pair twice keeps one entry and
/// sums the counts. Serialized as `{ concept: [{sourceFile, nbOccurence?}, ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ConceptTerm, Vec<Location>>", into = "BTreeMap<ConceptTerm, Vec<Location>>")]
pub struct ConceptLocationMap {
    entries: BTreeMap<ConceptTerm, BTreeMap<String, Option<u64>>>,
}

impl ConceptLocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, concept: impl Into<ConceptTerm>, file: impl Into<String>, occurrences: Option<u64>) {
        let slot = self
            .entries
            .entry(concept.into())
            .or_default()
            .entry(file.into())
            .or_insert(None);
        *slot = match (*slot, occurrences) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_concept(&self, concept: &str) -> bool {
        self.entries.contains_key(concept)
    }

    pub fn concepts(&self) -> impl Iterator<Item = &ConceptTerm> {
        self.entries.keys()
    }

    pub fn concept_set(&self) -> BTreeSet<ConceptTerm> {
        self.entries.keys().cloned().collect()
    }

    /// Raw file identifiers recorded for `concept` (empty when unknown).
    pub fn files(&self, concept: &str) -> BTreeSet<&str> {
        self.entries
            .get(concept)
            .map(|files| files.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// File identifiers for `concept` after normalization against `project_root`.
    pub fn normalized_files(&self, concept: &str, project_root: &str) -> BTreeSet<String> {
        self.files(concept)
            .into_iter()
            .map(|f| normalize_path(f, project_root))
            .collect()
    }

    pub fn locations(&self, concept: &str) -> BTreeSet<Location> {
        self.entries
            .get(concept)
            .map(|files| {
                files
                    .iter()
                    .map(|(f, n)| Location {
                        source_file: f.clone(),
                        occurrences: *n,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn occurrences(&self, concept: &str, file: &str) -> Option<u64> {
        self.entries.get(concept)?.get(file).copied().flatten()
    }

    /// Every file of every concept, normalized.
    pub fn all_normalized_files(&self, project_root: &str) -> BTreeSet<String> {
        self.entries
            .values()
            .flat_map(|files| files.keys())
            .map(|f| normalize_path(f, project_root))
            .collect()
    }

    /// (concept, file, occurrences) triples in concept then file order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConceptTerm, &str, Option<u64>)> {
        self.entries
            .iter()
            .flat_map(|(c, files)| files.iter().map(move |(f, n)| (c, f.as_str(), *n)))
    }
}

impl From<BTreeMap<ConceptTerm, Vec<Location>>> for ConceptLocationMap {
    fn from(raw: BTreeMap<ConceptTerm, Vec<Location>>) -> Self {
        let mut map = ConceptLocationMap::new();
        for (concept, locations) in raw {
            //keep concepts listed with no location, they still count as extracted terms
            map.entries.entry(concept.clone()).or_default();
            for loc in locations {
                map.record(concept.clone(), loc.source_file, loc.occurrences);
            }
        }
        map
    }
}

impl From<ConceptLocationMap> for BTreeMap<ConceptTerm, Vec<Location>> {
    fn from(map: ConceptLocationMap) -> Self {
        map.entries
            .into_iter()
            .map(|(concept, files)| {
                let locations = files
                    .into_iter()
                    .map(|(source_file, occurrences)| Location {
                        source_file,
                        occurrences,
                    })
                    .collect();
                (concept, locations)
            })
            .collect()
    }
}

impl<C: Into<ConceptTerm>> FromIterator<(C, Location)> for ConceptLocationMap {
    fn from_iter<I: IntoIterator<Item = (C, Location)>>(iter: I) -> Self {
        let mut map = ConceptLocationMap::new();
        for (concept, loc) in iter {
            map.record(concept, loc.source_file, loc.occurrences);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_collapses_duplicates_and_sums_counts() {
        let mut m = ConceptLocationMap::new();
        m.record("cart", "a.js", Some(2));
        m.record("cart", "a.js", Some(3));
        m.record("cart", "b.js", None);
        m.record("cart", "b.js", Some(1));

        assert_eq!(m.files("cart").len(), 2);
        assert_eq!(m.occurrences("cart", "a.js"), Some(5));
        assert_eq!(m.occurrences("cart", "b.js"), Some(1));
        assert_eq!(m.occurrences("ship", "a.js"), None);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let mut m = ConceptLocationMap::new();
        m.record("cart", "a.js", Some(u64::MAX - 1));
        m.record("cart", "a.js", Some(5));
        assert_eq!(m.occurrences("cart", "a.js"), Some(u64::MAX));
    }

    #[test]
    fn json_shape_matches_concept_map_files() {
        let raw = r#"{
            "cart": [{"sourceFile": "cart/server.js", "nbOccurence": 4}],
            "user": [{"sourceFile": "user/server.js"}, {"sourceFile": "user/server.js"}],
            "empty": []
        }"#;
        let m: ConceptLocationMap = serde_json::from_str(raw).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.files("user").len(), 1);
        assert_eq!(m.occurrences("cart", "cart/server.js"), Some(4));

        let back = serde_json::to_value(&m).unwrap();
        assert_eq!(back["user"][0]["sourceFile"], "user/server.js");
        assert!(back["user"][0].get("nbOccurence").is_none());
        assert_eq!(back["cart"][0]["nbOccurence"], 4);
    }

    #[test]
    fn normalized_files_apply_project_root() {
        let m: ConceptLocationMap = [
            ("order", Location::new(r"C:\x\shop\orders\api.py#L3")),
            ("order", Location::new("shop/orders/api.py")),
        ]
        .into_iter()
        .collect();

        assert_eq!(m.files("order").len(), 2);
        let norm = m.normalized_files("order", "shop");
        assert_eq!(norm.into_iter().collect::<Vec<_>>(), vec!["orders/api.py".to_string()]);
    }
}
