use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use concept_lattice::config::{Config, DEFAULT_CONFIG_FILE};
use concept_lattice::pipeline;

#[derive(Parser)]
#[command(
    name = "concept-lattice",
    version,
    about = "Concept location maps, matrices and concept lattices for a project"
)]
struct Cli {
    /// Configuration file (relative paths resolve against --root)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory holding the raw traces and receiving every output
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn raw traces into concept-location maps
    Generate {
        /// Only these projects instead of PROJECTS_TO_GENERATE
        #[arg(long = "project", value_name = "NAME")]
        projects: Vec<String>,
    },
    /// Compare the two maps of a project and build its lattice
    Analyse {
        /// Overrides PROJECT_TO_ANALYZE
        #[arg(long, value_name = "NAME")]
        project: Option<String>,

        /// Overrides MAX_CONCEPTS
        #[arg(long, value_name = "N")]
        max_concepts: Option<usize>,
    },
}

//RUST_LOG wins as a whole; info only when it is unset or unparsable
fn log_filter<E>(from_env: Result<EnvFilter, E>) -> EnvFilter {
    from_env.unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::try_from_default_env()))
        .init();

    let cli = Cli::parse();
    let config_path = cli.root.join(&cli.config);
    let mut config = Config::load(&config_path).context("loading configuration")?;

    match cli.command {
        Commands::Generate { projects } => {
            if !projects.is_empty() {
                config.projects_to_generate = projects;
            }
            let report = pipeline::generate_all(&config, &cli.root)?;
            info!(
                generated = report.generated.len(),
                failed = report.failed.len(),
                "generation finished"
            );
            if let Some((project, err)) = report.failed.first() {
                bail!("{} project(s) failed, first was {project}: {err:#}", report.failed.len());
            }
        }
        Commands::Analyse { project, max_concepts } => {
            if let Some(project) = project {
                config.project_to_analyze = project;
            }
            if max_concepts.is_some() {
                config.max_concepts = max_concepts;
            }
            let summary = pipeline::analyse(&config, &cli.root)?;
            info!(
                project = %summary.project,
                concepts = summary.concepts,
                shown = summary.concepts - summary.hidden_concepts,
                complete = summary.complete,
                "analysis finished"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn rust_log_can_quiet_below_info() {
        let f = log_filter::<()>(Ok(EnvFilter::new("warn")));
        assert_eq!(f.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn missing_rust_log_falls_back_to_info() {
        let f = log_filter(Err(()));
        assert_eq!(f.max_level_hint(), Some(LevelFilter::INFO));
    }
}
