use serde::{Deserialize, Serialize};

pub type ObjectId = usize;
pub type AttributeId = usize;
pub type ConceptId = usize;

/// A single whitespace-free concept token, e.g. `cart` out of `cart item`.
pub type ConceptTerm = String;

pub const IS_DB_FILE: &str = "is_db_file";
pub const IS_NOT_DB_FILE: &str = "is_not_db_file";

//row label marker for objects on the positive side of the partition
pub const DB_ROW_PREFIX: &str = "db|";

/// The two mutually exclusive tagging attributes every object carries exactly one of.
///
/// They classify objects (a file is, or is not, touched by the primary extraction) and
/// are never treated as domain concepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPair {
    pub positive: String,
    pub negative: String,
}

impl PartitionPair {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.positive == attribute || self.negative == attribute
    }

    pub fn pick(&self, positive: bool) -> &str {
        if positive { &self.positive } else { &self.negative }
    }
}

impl Default for PartitionPair {
    fn default() -> Self {
        Self::new(IS_DB_FILE, IS_NOT_DB_FILE)
    }
}

/// Split a (possibly multi-word) concept name into its distinct tokens, keeping first
/// occurrence order.
pub fn split_concept_name(name: &str) -> Vec<ConceptTerm> {
    let mut out: Vec<ConceptTerm> = Vec::new();
    for token in name.split_whitespace() {
        if !out.iter().any(|t| t == token) {
            out.push(token.to_string());
        }
    }
    out
}
