//! One end-to-end run: load inputs, generate, render, optionally write.

use std::fs;
use std::path::PathBuf;

use alertgen_core::Config;
use tracing::{debug, info};

use crate::generator::{GenerateError, Generation, GeneratorOptions, RuleGenerator};
use crate::output::{render_documents, OutputError, OutputWriter, RenderedDocument};
use crate::profile::{ConfigError, Profile, ProfileStore};
use crate::template::{RuleTemplateSet, TemplateError};

/// Errors that stop a run before any output is written.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Profiles(#[from] ConfigError),

    #[error(transparent)]
    Templates(#[from] TemplateError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to write report: {0}")]
    Report(String),
}

/// Inputs and results of a completed run.
#[derive(Debug)]
pub struct PipelineRun {
    pub profiles: Vec<Profile>,
    pub generation: Generation,
    pub documents: Vec<RenderedDocument>,
}

impl PipelineRun {
    /// Whether any input file or (profile, fragment) pair failed.
    pub fn has_failures(&self) -> bool {
        self.generation.report.has_failures()
    }
}

/// Load profiles and templates from the configured directories and generate.
///
/// Nothing is written; see [`write_run`].
pub fn run(config: &Config) -> Result<PipelineRun, PipelineError> {
    let store = ProfileStore::load(&config.paths.profiles_dir)?;
    let templates = RuleTemplateSet::load(
        &config.paths.templates_dir,
        &config.generation.category_glob,
    )?;
    info!(
        profiles = store.len(),
        fragments = templates.fragments().len(),
        templates = %templates.root().display(),
        category_glob = %templates.glob().as_str(),
        "inputs loaded"
    );

    let generator = RuleGenerator::new(GeneratorOptions::from(&config.generation));
    debug!(threads = generator.options().threads, "generating");
    let mut generation = generator.generate(store.profiles(), templates.fragments())?;
    generation
        .report
        .add_load_results(store.load_results().iter().chain(templates.load_results()));
    generation.report.config = Some(config.summary());

    let documents = render_documents(
        store.profiles(),
        &generation.rules,
        &config.generation.interval,
        config.generation.org_id,
    )?;

    Ok(PipelineRun {
        profiles: store.profiles().to_vec(),
        generation,
        documents,
    })
}

/// Write provisioning files and, when configured, the JSON report.
pub fn write_run(config: &Config, run: &PipelineRun) -> Result<Vec<PathBuf>, PipelineError> {
    let written = OutputWriter::new(&config.paths.output_dir).write_all(&run.documents)?;
    if let Some(path) = &config.paths.report_path {
        let json = run
            .generation
            .report
            .to_json()
            .map_err(|e| PipelineError::Report(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(OutputError::from)?;
        }
        fs::write(path, json).map_err(OutputError::from)?;
        info!(path = %path.display(), "wrote generation report");
    }
    Ok(written)
}
