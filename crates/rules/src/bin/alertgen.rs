//! alertgen: generate Grafana alert rules from environment profiles and
//! rule template fragments.
//!
//! Subcommands:
//! - `generate`: write one provisioning file per enabled profile
//! - `check`: generate in memory and fail on any error
//! - `profiles`: list loaded profiles

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use alertgen_core::config::{load_dotenv, Config};
use alertgen_rules::generator::GenerateError;
use alertgen_rules::pipeline::{self, PipelineError, PipelineRun};
use alertgen_rules::profile::ProfileStore;
use alertgen_rules::watch::{self, DEFAULT_DEBOUNCE};

// ── CLI ─────────────────────────────────────────────────────────────

/// Alert-rule generator for Grafana alerting provisioning.
#[derive(Parser, Debug)]
#[command(name = "alertgen", version, about)]
struct Cli {
    #[command(flatten)]
    inputs: InputArgs,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for the env-derived configuration.
#[derive(Args, Debug)]
struct InputArgs {
    /// Directory of profile YAML files.
    #[arg(long, global = true)]
    profiles_dir: Option<PathBuf>,

    /// Root of the template fragment tree.
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    /// Only load fragments whose category matches this glob.
    #[arg(long, global = true)]
    category: Option<String>,

    /// Worker threads for generation (1 = sequential).
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and write provisioning files.
    Generate {
        /// Output directory for `<profile>.yaml` files.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Write a JSON generation report here.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit non-zero when any input file or pair failed.
        #[arg(long)]
        strict: bool,

        /// Keep running and regenerate when inputs change.
        #[arg(long)]
        watch: bool,
    },
    /// Generate without writing; exit non-zero on any failure.
    Check,
    /// List loaded profiles.
    Profiles,
}

impl InputArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.profiles_dir {
            config.paths.profiles_dir = dir.clone();
        }
        if let Some(dir) = &self.templates_dir {
            config.paths.templates_dir = dir.clone();
        }
        if let Some(glob) = &self.category {
            config.generation.category_glob = glob.clone();
        }
        if let Some(threads) = self.threads {
            config.generation.threads = threads.max(1);
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;
    cli.inputs.apply(&mut config);

    match cli.command {
        Command::Generate {
            output_dir,
            report,
            strict,
            watch: watch_mode,
        } => {
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }
            if report.is_some() {
                config.paths.report_path = report;
            }
            config.log_summary();

            let code = generate_once(&config, strict);
            if !watch_mode {
                return Ok(code);
            }
            let dirs = watch::input_dirs(&config.paths.profiles_dir, &config.paths.templates_dir);
            watch::watch(&dirs, DEFAULT_DEBOUNCE, || {
                generate_once(&config, strict);
            })
            .context("watch mode stopped")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => check(&config),
        Command::Profiles => list_profiles(&config),
    }
}

/// One generate-and-write pass. Errors are logged, never propagated, so
/// watch mode keeps running; the previous output stays in place on failure.
fn generate_once(config: &Config, strict: bool) -> ExitCode {
    let run = match pipeline::run(config) {
        Ok(run) => run,
        Err(e) => {
            log_pipeline_error(&e);
            return ExitCode::FAILURE;
        }
    };
    log_failures(&run);
    if let Err(e) = pipeline::write_run(config, &run) {
        log_pipeline_error(&e);
        return ExitCode::FAILURE;
    }
    if strict && run.has_failures() {
        error!("failures present and --strict set");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn check(config: &Config) -> Result<ExitCode> {
    let run = match pipeline::run(config) {
        Ok(run) => run,
        Err(e) => {
            log_pipeline_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };
    log_failures(&run);
    let summary = &run.generation.report.summary;
    info!(
        generated = summary.generated,
        failed = summary.failed,
        load_failures = summary.load_failures,
        overlaps = summary.overlaps,
        "check complete"
    );
    if run.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn list_profiles(config: &Config) -> Result<ExitCode> {
    let store = ProfileStore::load(&config.paths.profiles_dir)
        .with_context(|| format!("failed to load {}", config.paths.profiles_dir.display()))?;
    for profile in store.profiles() {
        let state = if profile.enabled { "enabled" } else { "disabled" };
        println!(
            "{:<20} {:<9} folder={} values={}",
            profile.id,
            state,
            profile.folder,
            profile.values.len()
        );
    }
    for failed in store.failures() {
        warn!(path = %failed.path.display(), "profile failed to load");
    }
    Ok(ExitCode::SUCCESS)
}

fn log_failures(run: &PipelineRun) {
    let report = &run.generation.report;
    for failure in &report.load_failures {
        warn!(path = %failure.path.display(), error = %failure.error, "input file failed to load");
    }
    for (pair, err) in report.failures() {
        warn!(profile = %pair.profile, fragment = %pair.fragment, error = %err, "pair failed");
    }
    for overlap in &report.overlaps {
        warn!(
            fragment = %overlap.fragment,
            profiles = %overlap.profiles.join(","),
            "profiles render an identical query"
        );
    }
}

fn log_pipeline_error(err: &PipelineError) {
    match err {
        PipelineError::Generate(GenerateError::Duplicates(dup)) => {
            for conflict in &dup.conflicts {
                error!(conflict = %conflict, "duplicate rule");
            }
            error!(count = dup.conflicts.len(), "generation aborted; no output written");
        }
        other => error!(error = %other, "generation failed"),
    }
}
