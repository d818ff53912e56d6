use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::{AlertgenError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Numeric settings fail loudly: a typo in a thread count or org id should
/// not silently fall back to a default.
fn profiled_env_parse<T>(profile: &str, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match profiled_env_opt(profile, key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| AlertgenError::InvalidSetting {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active config profile name (empty = default). Unrelated to alert
    /// profiles: this only selects an env-var prefix.
    pub profile: String,
    pub paths: PathsConfig,
    pub generation: GenerationConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ALERTGEN_PROFILE`. When set (e.g. `CI`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or("ALERTGEN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let config = Self {
            profile: p.to_string(),
            paths: PathsConfig::from_env_profiled(p),
            generation: GenerationConfig::from_env_profiled(p)?,
        };
        config.generation.validate()?;
        Ok(config)
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  profiles:    dir={}", self.paths.profiles_dir.display());
        tracing::info!(
            "  templates:   dir={}, glob={}",
            self.paths.templates_dir.display(),
            self.generation.category_glob
        );
        tracing::info!("  output:      dir={}", self.paths.output_dir.display());
        tracing::info!(
            "  generation:  interval={}, org_id={}, threads={}",
            self.generation.interval,
            self.generation.org_id,
            self.generation.threads
        );
    }

    /// JSON view embedded into generation reports.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "paths": {
                "profiles_dir": self.paths.profiles_dir,
                "templates_dir": self.paths.templates_dir,
                "output_dir": self.paths.output_dir,
            },
            "generation": {
                "category_glob": self.generation.category_glob,
                "interval": self.generation.interval,
                "org_id": self.generation.org_id,
                "threads": self.generation.threads,
            },
        })
    }
}

// ── Paths ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub profiles_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub output_dir: PathBuf,
    pub report_path: Option<PathBuf>,
}

impl PathsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            profiles_dir: PathBuf::from(profiled_env_or(p, "ALERTGEN_PROFILES_DIR", "data/profiles")),
            templates_dir: PathBuf::from(profiled_env_or(p, "ALERTGEN_TEMPLATES_DIR", "data/templates")),
            output_dir: PathBuf::from(profiled_env_or(p, "ALERTGEN_OUTPUT_DIR", "out/alerting")),
            report_path: profiled_env_opt(p, "ALERTGEN_REPORT").map(PathBuf::from),
        }
    }
}

// ── Generation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Category filter applied while loading templates (`**` = everything).
    pub category_glob: String,
    /// Evaluation interval written on every rule group.
    pub interval: String,
    /// Grafana organisation id for the generated groups.
    pub org_id: i64,
    /// Datasource used when a fragment does not name one.
    pub datasource_uid: String,
    /// Pending period used when a fragment omits `for`.
    pub default_for: String,
    /// Worker threads for pair generation; 1 runs sequentially.
    pub threads: usize,
}

impl GenerationConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        Ok(Self {
            category_glob: profiled_env_or(p, "ALERTGEN_CATEGORY_GLOB", "**"),
            interval: profiled_env_or(p, "ALERTGEN_INTERVAL", "1m"),
            org_id: profiled_env_parse(p, "ALERTGEN_ORG_ID", 1)?,
            datasource_uid: profiled_env_or(p, "ALERTGEN_DATASOURCE_UID", "prometheus"),
            default_for: profiled_env_or(p, "ALERTGEN_DEFAULT_FOR", "5m"),
            threads: profiled_env_parse(p, "ALERTGEN_THREADS", default_threads())?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        parse_duration(&self.interval)?;
        parse_duration(&self.default_for)?;
        if self.threads == 0 {
            return Err(AlertgenError::InvalidSetting {
                key: "ALERTGEN_THREADS".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.datasource_uid.trim().is_empty() {
            return Err(AlertgenError::InvalidSetting {
                key: "ALERTGEN_DATASOURCE_UID".to_string(),
                value: self.datasource_uid.clone(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            category_glob: "**".to_string(),
            interval: "1m".to_string(),
            org_id: 1,
            datasource_uid: "prometheus".to_string(),
            default_for: "5m".to_string(),
            threads: default_threads(),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
