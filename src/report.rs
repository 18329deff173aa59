/*
Rendering of analysis results:

    reconciliation diff  -> CSV (one row per concept)

    presence matrix      -> CSV (File, partition pair, concept columns; True/False cells)

    occurrence matrix    -> CSV (category totals, blank line, per-file counts)

    pruned lattice       -> TOON document (concepts with labels, covers, hidden ids)

    concept map          -> pretty JSON, the shape the analysis reads back
*/
use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

use crate::core::context::FormalContext;
use crate::core::prune::PrunedLattice;
use crate::core::types::ConceptId;
use crate::mapping::generator::{IncidenceMatrix, OccurrenceMatrix};
use crate::mapping::location::ConceptLocationMap;
use crate::mapping::reconcile::Reconciliation;

pub const FIRST_METHOD: &str = "HEURISTIC";
pub const SECOND_METHOD: &str = "TEXT_RETRIEVAL";

const EMPTY_CELL: &str = "None";
const FILE_SEPARATOR: &str = ";";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toon encoding failed: {0}")]
    Toon(String),
}

//quote a field only when it would otherwise break the row
fn csv_field(raw: &str) -> Cow<'_, str> {
    if raw.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", raw.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(raw)
    }
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = Cow<'a, str>>) {
    let mut first = true;
    for f in fields {
        if !first {
            out.push(',');
        }
        out.push_str(&csv_field(&f));
        first = false;
    }
    out.push('\n');
}

fn bool_cell(b: bool) -> Cow<'static, str> {
    Cow::Borrowed(if b { "True" } else { "False" })
}

fn joined_or_none<'a>(files: impl IntoIterator<Item = &'a String>) -> Cow<'static, str> {
    let joined = files.into_iter().map(String::as_str).collect::<Vec<_>>().join(FILE_SEPARATOR);
    if joined.is_empty() {
        Cow::Borrowed(EMPTY_CELL)
    } else {
        Cow::Owned(joined)
    }
}

/// One row per concept seen by either method, concepts found by the first method first.
pub fn reconciliation_csv(diff: &Reconciliation) -> String {
    let mut rows: Vec<(&String, bool, bool)> = diff
        .all_concepts()
        .into_iter()
        .map(|c| (c, diff.in_first(c), diff.in_second(c)))
        .collect();
    rows.sort_by(|a, b| (!a.1, !a.2, a.0).cmp(&(!b.1, !b.2, b.0)));

    let mut out = String::new();
    push_row(
        &mut out,
        [
            "Concept".to_string(),
            format!("Present in {FIRST_METHOD}"),
            format!("Present in {SECOND_METHOD}"),
            format!("Files only in {FIRST_METHOD}"),
            format!("Files only in {SECOND_METHOD}"),
        ]
        .map(Cow::Owned),
    );
    for (concept, in_first, in_second) in rows {
        let diff_of = diff.differences.get(concept);
        push_row(
            &mut out,
            [
                Cow::Borrowed(concept.as_str()),
                bool_cell(in_first),
                bool_cell(in_second),
                joined_or_none(diff_of.into_iter().flat_map(|d| &d.only_in_first)),
                joined_or_none(diff_of.into_iter().flat_map(|d| &d.only_in_second)),
            ],
        );
    }
    out
}

/// `File, <positive>, <negative>, <concepts...>`; one row per object of the context.
pub fn presence_csv(matrix: &IncidenceMatrix) -> String {
    let ctx = &matrix.context;
    let mut out = String::new();

    let header = std::iter::once("File")
        .chain([matrix.partition.positive.as_str(), matrix.partition.negative.as_str()])
        .chain(matrix.concept_columns.iter().map(|&a| ctx.attributes()[a].as_str()))
        .map(Cow::Borrowed);
    push_row(&mut out, header);

    for o in 0..ctx.object_count() {
        let primary = matrix.is_primary(o);
        let cells = [Cow::Owned(matrix.row_label(o)), bool_cell(primary), bool_cell(!primary)]
            .into_iter()
            .chain(matrix.concept_columns.iter().map(|&a| bool_cell(ctx.incident(o, a))));
        push_row(&mut out, cells);
    }
    out
}

pub fn occurrence_csv(matrix: &OccurrenceMatrix) -> String {
    let mut out = String::new();
    let header = std::iter::once("Category/File")
        .chain(matrix.concepts.iter().map(String::as_str))
        .map(Cow::Borrowed);
    push_row(&mut out, header);

    let row = |out: &mut String, label: &str, counts: &[u64]| {
        let cells = std::iter::once(Cow::Owned(label.to_string()))
            .chain(counts.iter().map(|c| Cow::Owned(c.to_string())));
        push_row(out, cells);
    };
    for r in &matrix.categories {
        row(&mut out, &r.label, &r.counts);
    }
    out.push('\n');
    for r in &matrix.files {
        row(&mut out, &r.label, &r.counts);
    }
    out
}

/// Which side(s) of the partition a concept's intent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptSide {
    Positive,
    Negative,
    Both,
    Neither,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConceptEntry {
    pub id: ConceptId,
    pub side: ConceptSide,
    pub extent: Vec<String>,
    /// Concept terms only; the partition attributes are reported through `side`.
    pub intent: Vec<String>,
    pub parents: Vec<ConceptId>,
}

/// Serializable form of a (pruned) lattice.
#[derive(Debug, Clone, Serialize)]
pub struct LatticeDocument {
    pub project: String,
    pub complete: bool,
    pub top: Option<ConceptId>,
    pub bottom: Option<ConceptId>,
    pub hidden: Vec<ConceptId>,
    pub concepts: Vec<ConceptEntry>,
}

impl LatticeDocument {
    pub fn new(project: &str, ctx: &FormalContext, view: &PrunedLattice<'_>, complete: bool) -> Self {
        let coloring = ctx.coloring_attributes();
        let partition = ctx.partition();
        let source = view.source();

        let concepts = view
            .concepts()
            .map(|(id, c)| {
                let side = match partition {
                    Some((pos, neg)) => match (c.intent.contains(pos), c.intent.contains(neg)) {
                        (true, true) => ConceptSide::Both,
                        (true, false) => ConceptSide::Positive,
                        (false, true) => ConceptSide::Negative,
                        (false, false) => ConceptSide::Neither,
                    },
                    None => ConceptSide::Neither,
                };
                ConceptEntry {
                    id,
                    side,
                    extent: ctx.object_labels(&c.extent).into_iter().map(String::from).collect(),
                    intent: ctx
                        .attribute_labels(&c.intent.difference(&coloring))
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    parents: view.parents(id),
                }
            })
            .collect();

        Self {
            project: project.to_string(),
            complete,
            top: source.top(),
            bottom: source.bottom(),
            hidden: view.removed().to_vec(),
            concepts,
        }
    }

    pub fn to_toon(&self) -> Result<String, ReportError> {
        let value = serde_json::to_value(self)?;
        toon_format::encode_default(&value).map_err(|e| ReportError::Toon(e.to_string()))
    }
}

pub fn concept_map_json(map: &ConceptLocationMap) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(map)?)
}
