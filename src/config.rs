// config.json: which projects to process and how the analysis is shaped
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::lattice::LatticeLimits;
use crate::mapping::extract::TechnologyFilter;
use crate::mapping::generator::AttributeScope;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_EXCLUDED_TECHNOLOGY: &str = "express";

//placeholder substituted by the project name in every layout template
const PROJECT_PLACEHOLDER: &str = "{project}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("GENERATE_OCCURRENCE_MATRIX requires KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS")]
    OccurrenceWithoutDbRestriction,
    #[error("PROJECT_TO_ANALYZE is empty")]
    MissingProject,
    #[error("MAX_CONCEPTS must be at least 1")]
    ZeroConceptCeiling,
    #[error("layout entry {key} = `{template}` does not contain `{{project}}`")]
    TemplateWithoutProject { key: &'static str, template: String },
}

/// Where every input and output of a project lives, relative to the working root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Layout {
    pub raw_heuristics: String,
    pub raw_text_retrieval: String,
    pub concepts_from_heuristics: String,
    pub concepts_from_text_retrieval: String,
    pub results_csv: String,
    pub presence_matrix: String,
    pub occurrence_matrix: String,
    pub lattice: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            raw_heuristics: "raw_response_from_heuristics/results_{project}.json".into(),
            raw_text_retrieval: "raw_response_from_text-retrieval/results_{project}.json".into(),
            concepts_from_heuristics: "concepts_from_heuristics/{project}.json".into(),
            concepts_from_text_retrieval: "concepts_from_text_retrieval/{project}.json".into(),
            results_csv: "results_csv/{project}.csv".into(),
            presence_matrix: "results_matrix/{project}_presence.csv".into(),
            occurrence_matrix: "results_matrix/{project}_occurrence.csv".into(),
            lattice: "results_lattice/{project}.toon".into(),
        }
    }
}

impl Layout {
    fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("RAW_HEURISTICS", self.raw_heuristics.as_str()),
            ("RAW_TEXT_RETRIEVAL", self.raw_text_retrieval.as_str()),
            ("CONCEPTS_FROM_HEURISTICS", self.concepts_from_heuristics.as_str()),
            ("CONCEPTS_FROM_TEXT_RETRIEVAL", self.concepts_from_text_retrieval.as_str()),
            ("RESULTS_CSV", self.results_csv.as_str()),
            ("PRESENCE_MATRIX", self.presence_matrix.as_str()),
            ("OCCURRENCE_MATRIX", self.occurrence_matrix.as_str()),
            ("LATTICE", self.lattice.as_str()),
        ]
    }

    /// Expand `template` for `project` under `root`.
    pub fn resolve(root: &Path, template: &str, project: &str) -> PathBuf {
        root.join(template.replace(PROJECT_PLACEHOLDER, project))
    }

    pub fn project_paths(&self, root: &Path, project: &str) -> ProjectPaths {
        let at = |t: &str| Self::resolve(root, t, project);
        ProjectPaths {
            raw_heuristics: at(&self.raw_heuristics),
            raw_text_retrieval: at(&self.raw_text_retrieval),
            concepts_from_heuristics: at(&self.concepts_from_heuristics),
            concepts_from_text_retrieval: at(&self.concepts_from_text_retrieval),
            results_csv: at(&self.results_csv),
            presence_matrix: at(&self.presence_matrix),
            occurrence_matrix: at(&self.occurrence_matrix),
            lattice: at(&self.lattice),
        }
    }
}

/// Layout templates expanded for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub raw_heuristics: PathBuf,
    pub raw_text_retrieval: PathBuf,
    pub concepts_from_heuristics: PathBuf,
    pub concepts_from_text_retrieval: PathBuf,
    pub results_csv: PathBuf,
    pub presence_matrix: PathBuf,
    pub occurrence_matrix: PathBuf,
    pub lattice: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Config {
    pub project_to_analyze: String,
    pub projects_to_generate: Vec<String>,
    /// Keep only database concepts in the heuristics map; gates the occurrence matrix.
    pub keep_db_concepts_only_from_heuristics: bool,
    /// Restrict matrix columns to concepts found by both methods.
    pub focus_on_heuristic_concepts: bool,
    pub exclude_technology: String,
    /// Technology filter switch; unset follows KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS.
    pub exclude_technology_nodes: Option<bool>,
    /// Columns only from heuristics concepts; unset follows KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS.
    pub restrict_to_heuristic_concepts: Option<bool>,
    /// Unset follows KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS.
    pub generate_occurrence_matrix: Option<bool>,
    pub max_concepts: Option<usize>,
    pub drop_empty_rows: bool,
    #[serde(flatten)]
    pub layout: Layout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_to_analyze: String::new(),
            projects_to_generate: Vec::new(),
            keep_db_concepts_only_from_heuristics: false,
            focus_on_heuristic_concepts: false,
            exclude_technology: DEFAULT_EXCLUDED_TECHNOLOGY.into(),
            exclude_technology_nodes: None,
            restrict_to_heuristic_concepts: None,
            generate_occurrence_matrix: None,
            max_concepts: None,
            drop_empty_rows: true,
            layout: Layout::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Checks shared by both jobs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generate_occurrence_matrix == Some(true) && !self.keep_db_concepts_only_from_heuristics {
            return Err(ConfigError::OccurrenceWithoutDbRestriction);
        }
        if self.max_concepts == Some(0) {
            return Err(ConfigError::ZeroConceptCeiling);
        }
        for (key, template) in self.layout.entries() {
            if !template.contains(PROJECT_PLACEHOLDER) {
                return Err(ConfigError::TemplateWithoutProject {
                    key,
                    template: template.to_string(),
                });
            }
        }
        Ok(())
    }

    /// `validate` plus what only the analysis needs.
    pub fn validate_for_analysis(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.project_to_analyze.trim().is_empty() {
            return Err(ConfigError::MissingProject);
        }
        Ok(())
    }

    pub fn technology_filter(&self) -> Option<TechnologyFilter> {
        self.exclude_technology_nodes
            .unwrap_or(self.keep_db_concepts_only_from_heuristics)
            .then(|| TechnologyFilter::new(self.exclude_technology.clone()))
    }

    pub fn occurrence_matrix_enabled(&self) -> bool {
        self.generate_occurrence_matrix
            .unwrap_or(self.keep_db_concepts_only_from_heuristics)
    }

    //FOCUS_ON_HEURISTIC_CONCEPTS wins over the heuristics-only restriction
    pub fn attribute_scope(&self) -> AttributeScope {
        if self.focus_on_heuristic_concepts {
            AttributeScope::Common
        } else if self
            .restrict_to_heuristic_concepts
            .unwrap_or(self.keep_db_concepts_only_from_heuristics)
        {
            AttributeScope::Primary
        } else {
            AttributeScope::All
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            scope: self.attribute_scope(),
            drop_empty_rows: self.drop_empty_rows,
            occurrence_matrix: self.occurrence_matrix_enabled(),
            limits: LatticeLimits {
                max_concepts: self.max_concepts,
            },
        }
    }
}

/// Knobs of one `analyse` run, derived from the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub scope: AttributeScope,
    pub drop_empty_rows: bool,
    pub occurrence_matrix: bool,
    pub limits: LatticeLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.drop_empty_rows);
        assert_eq!(cfg.exclude_technology, "express");
        assert!(cfg.technology_filter().is_none());
        assert!(!cfg.occurrence_matrix_enabled());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn reads_screaming_case_keys() {
        let cfg = Config::from_json(
            r#"{
                "PROJECT_TO_ANALYZE": "robot-shop-master",
                "KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS": true,
                "FOCUS_ON_HEURISTIC_CONCEPTS": true,
                "PROJECTS_TO_GENERATE": ["robot-shop-master", "petclinic"],
                "MAX_CONCEPTS": 500,
                "RESULTS_CSV": "out/{project}.csv"
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.project_to_analyze, "robot-shop-master");
        assert_eq!(cfg.projects_to_generate.len(), 2);
        assert_eq!(cfg.technology_filter(), Some(TechnologyFilter::new("express")));
        assert!(cfg.occurrence_matrix_enabled());

        let opts = cfg.analysis_options();
        assert_eq!(opts.scope, AttributeScope::Common);
        assert_eq!(opts.limits.max_concepts, Some(500));

        let paths = cfg.layout.project_paths(Path::new("/work"), "petclinic");
        assert_eq!(paths.results_csv, PathBuf::from("/work/out/petclinic.csv"));
        assert_eq!(
            paths.concepts_from_heuristics,
            PathBuf::from("/work/concepts_from_heuristics/petclinic.json")
        );
        assert!(cfg.validate_for_analysis().is_ok());
    }

    #[test]
    fn technology_switch_is_independent_of_db_restriction() {
        let cfg = Config::from_json(r#"{"EXCLUDE_TECHNOLOGY_NODES": true, "EXCLUDE_TECHNOLOGY": "spring"}"#).unwrap();
        assert!(!cfg.keep_db_concepts_only_from_heuristics);
        assert_eq!(cfg.technology_filter(), Some(TechnologyFilter::new("spring")));

        let cfg = Config::from_json(
            r#"{"KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS": true, "EXCLUDE_TECHNOLOGY_NODES": false}"#,
        )
        .unwrap();
        assert!(cfg.technology_filter().is_none());
    }

    #[test]
    fn heuristics_only_columns_follow_db_restriction_unless_set() {
        assert_eq!(Config::default().attribute_scope(), AttributeScope::All);

        let cfg = Config::from_json(r#"{"KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS": true}"#).unwrap();
        assert_eq!(cfg.analysis_options().scope, AttributeScope::Primary);

        let cfg = Config::from_json(
            r#"{"KEEP_DB_CONCEPTS_ONLY_FROM_HEURISTICS": true, "RESTRICT_TO_HEURISTIC_CONCEPTS": false}"#,
        )
        .unwrap();
        assert_eq!(cfg.attribute_scope(), AttributeScope::All);

        let cfg = Config::from_json(r#"{"RESTRICT_TO_HEURISTIC_CONCEPTS": true}"#).unwrap();
        assert_eq!(cfg.attribute_scope(), AttributeScope::Primary);

        let cfg = Config::from_json(
            r#"{"RESTRICT_TO_HEURISTIC_CONCEPTS": true, "FOCUS_ON_HEURISTIC_CONCEPTS": true}"#,
        )
        .unwrap();
        assert_eq!(cfg.attribute_scope(), AttributeScope::Common);
    }

    #[test]
    fn occurrence_matrix_without_db_restriction_is_rejected() {
        let cfg = Config::from_json(r#"{"GENERATE_OCCURRENCE_MATRIX": true}"#).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::OccurrenceWithoutDbRestriction)));
    }

    #[test]
    fn analysis_needs_a_project_and_sane_layout() {
        let cfg = Config::default();
        assert!(matches!(cfg.validate_for_analysis(), Err(ConfigError::MissingProject)));

        let cfg = Config::from_json(r#"{"PROJECT_TO_ANALYZE": "p", "LATTICE": "lattice.toon"}"#).unwrap();
        match cfg.validate_for_analysis() {
            Err(ConfigError::TemplateWithoutProject { key, .. }) => assert_eq!(key, "LATTICE"),
            other => panic!("expected TemplateWithoutProject, got {other:?}"),
        }

        let cfg = Config::from_json(r#"{"PROJECT_TO_ANALYZE": "p", "MAX_CONCEPTS": 0}"#).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroConceptCeiling)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load(Path::new("/definitely/not/here/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
