/*
The two batch jobs.

generate: for every project in PROJECTS_TO_GENERATE
    raw heuristics trace      -> concepts_from_heuristics/{project}.json
    raw text-retrieval trace  -> concepts_from_text_retrieval/{project}.json
  projects are independent and run on the rayon pool; one failing project does not
  stop the others.

analyse: for PROJECT_TO_ANALYZE
    both concept maps -> reconciliation CSV
                      -> presence matrix CSV -> formal context -> lattice -> pruned view -> TOON
                      -> occurrence matrix CSV (only with the db restriction)
*/
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, ProjectPaths};
use crate::core::lattice::ConceptLatticeBuilder;
use crate::core::prune::LatticePruner;
use crate::mapping::extract::{ConceptExtractor, StructuralExtractor, TokenScanExtractor};
use crate::mapping::generator::{AttributeScope, IncidenceMatrixBuilder, OccurrenceMatrix};
use crate::mapping::location::ConceptLocationMap;
use crate::mapping::reconcile::reconcile;
use crate::report::{self, LatticeDocument};

/// serde_json's default recursion limit (128 nested arrays or objects) stays on: a trace
/// nested deeper is rejected here with a parse error instead of reaching the extractors.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProject {
    pub project: String,
    pub heuristic_concepts: usize,
    pub text_concepts: usize,
}

#[derive(Debug, Default)]
pub struct GenerateReport {
    pub generated: Vec<GeneratedProject>,
    pub failed: Vec<(String, anyhow::Error)>,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Extract both concept maps of one project and write them next to each other.
pub fn generate_project(config: &Config, root: &Path, project: &str) -> Result<GeneratedProject> {
    let paths = config.layout.project_paths(root, project);

    let structural = StructuralExtractor::new(project).with_technology_filter(config.technology_filter());
    let heuristics = extract_to_file(
        &structural,
        &paths.raw_heuristics,
        &paths.concepts_from_heuristics,
    )?;

    let token_scan = TokenScanExtractor::new(project);
    let text = extract_to_file(
        &token_scan,
        &paths.raw_text_retrieval,
        &paths.concepts_from_text_retrieval,
    )?;

    info!(
        project,
        heuristic_concepts = heuristics.len(),
        text_concepts = text.len(),
        "concept maps generated"
    );
    Ok(GeneratedProject {
        project: project.to_string(),
        heuristic_concepts: heuristics.len(),
        text_concepts: text.len(),
    })
}

fn extract_to_file(extractor: &impl ConceptExtractor, source: &Path, target: &Path) -> Result<ConceptLocationMap> {
    let trace: Value = read_json(source)?;
    let map = extractor
        .extract_map(&trace)
        .with_context(|| format!("extracting concepts from {}", source.display()))?;
    write_output(target, &report::concept_map_json(&map)?)?;
    Ok(map)
}

/// Run `generate_project` for every configured project in parallel.
pub fn generate_all(config: &Config, root: &Path) -> Result<GenerateReport> {
    config.validate()?;
    if config.projects_to_generate.is_empty() {
        warn!("PROJECTS_TO_GENERATE is empty, nothing to do");
    }

    let results: Vec<(String, Result<GeneratedProject>)> = config
        .projects_to_generate
        .par_iter()
        .map(|project| (project.clone(), generate_project(config, root, project)))
        .collect();

    let mut report = GenerateReport::default();
    for (project, result) in results {
        match result {
            Ok(done) => report.generated.push(done),
            Err(err) => {
                warn!(project = %project, error = %format!("{err:#}"), "project generation failed");
                report.failed.push((project, err));
            }
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub project: String,
    pub common_concepts: usize,
    pub only_first: usize,
    pub only_second: usize,
    pub differing_concepts: usize,
    pub objects: usize,
    pub attributes: usize,
    pub concepts: usize,
    pub hidden_concepts: usize,
    pub complete: bool,
    pub occurrence_matrix: bool,
}

/// Compare, tabulate and lattice the two concept maps of `PROJECT_TO_ANALYZE`.
pub fn analyse(config: &Config, root: &Path) -> Result<AnalysisSummary> {
    config.validate_for_analysis()?;
    let project = config.project_to_analyze.as_str();
    let paths = config.layout.project_paths(root, project);
    let opts = config.analysis_options();

    let heuristics: ConceptLocationMap = read_json(&paths.concepts_from_heuristics)?;
    let text: ConceptLocationMap = read_json(&paths.concepts_from_text_retrieval)?;

    let diff = reconcile(&heuristics, &text, project);
    info!(
        project,
        common = diff.common.len(),
        only_heuristic = diff.unique_to_first.len(),
        only_text_retrieval = diff.unique_to_second.len(),
        differing = diff.differences.len(),
        "concept maps compared"
    );
    info!(
        project,
        common = ?diff.common,
        only_heuristic = ?diff.unique_to_first,
        only_text_retrieval = ?diff.unique_to_second,
        "concept names"
    );
    for (concept, d) in &diff.differences {
        debug!(
            concept = %concept,
            only_heuristic = ?d.only_in_first,
            only_text_retrieval = ?d.only_in_second,
            "locations differ"
        );
    }
    write_output(&paths.results_csv, &report::reconciliation_csv(&diff))?;

    let matrix = IncidenceMatrixBuilder::new(&heuristics, project)
        .with_secondary(&text)
        .scope(opts.scope)
        .drop_empty_rows(opts.drop_empty_rows)
        .build_presence()
        .context("building the presence matrix")?;
    write_output(&paths.presence_matrix, &report::presence_csv(&matrix))?;

    let build = ConceptLatticeBuilder::with_limits(opts.limits).build(&matrix.context);
    if !build.is_complete() {
        warn!(project, "lattice written from a partial enumeration");
    }
    let lattice = build.lattice();
    let view = LatticePruner::for_context(&matrix.context).prune(lattice);
    info!(
        project,
        concepts = lattice.len(),
        shown = view.len(),
        hidden = view.removed().len(),
        "lattice pruned"
    );
    let doc = LatticeDocument::new(project, &matrix.context, &view, build.is_complete());
    write_output(&paths.lattice, &doc.to_toon()?)?;

    if opts.occurrence_matrix {
        write_occurrence_matrix(&heuristics, &text, project, &paths)?;
    }

    Ok(AnalysisSummary {
        project: project.to_string(),
        common_concepts: diff.common.len(),
        only_first: diff.unique_to_first.len(),
        only_second: diff.unique_to_second.len(),
        differing_concepts: diff.differences.len(),
        objects: matrix.context.object_count(),
        attributes: matrix.context.attribute_count(),
        concepts: lattice.len(),
        hidden_concepts: view.removed().len(),
        complete: build.is_complete(),
        occurrence_matrix: opts.occurrence_matrix,
    })
}

//columns are always the concepts both methods found, whatever the presence scope
fn write_occurrence_matrix(
    heuristics: &ConceptLocationMap,
    text: &ConceptLocationMap,
    project: &str,
    paths: &ProjectPaths,
) -> Result<()> {
    let matrix = IncidenceMatrixBuilder::new(heuristics, project)
        .with_secondary(text)
        .scope(AttributeScope::Common)
        .build_occurrence()
        .context("building the occurrence matrix")?;
    let occurrences = OccurrenceMatrix::from_incidence(&matrix);
    write_output(&paths.occurrence_matrix, &report::occurrence_csv(&occurrences))
}
