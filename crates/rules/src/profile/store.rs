//! [`ProfileStore`]: loads every profile file in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::load::{is_dotfile, is_yaml, LoadResult, LoadStatus};

use super::error::{ConfigError, Result};
use super::types::{Profile, ProfileFile, ValueText};

/// Read-only set of profiles for one generation run, in load order.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
    results: Vec<LoadResult>,
}

impl ProfileStore {
    /// Load all `*.yml` / `*.yaml` files directly inside `dir`, in filename order.
    ///
    /// Dotfiles and other extensions are skipped; subdirectories are ignored.
    /// A malformed file fails only that profile (see [`load_results`]).
    ///
    /// [`load_results`]: ProfileStore::load_results
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ConfigError::MissingDirectory(dir.to_path_buf()));
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut results = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if is_dotfile(&path) {
                results.push(skipped(path, "dotfile"));
            } else if !is_yaml(&path) {
                results.push(skipped(path, "not a YAML file"));
            } else {
                paths.push(path);
            }
        }
        paths.sort();

        let mut store = Self {
            profiles: Vec::with_capacity(paths.len()),
            results,
        };
        for path in paths {
            let outcome = Self::load_file(&path).and_then(|p| store.check_unique(p, &path));
            match outcome {
                Ok(profile) => {
                    info!(
                        profile = %profile.id,
                        enabled = profile.enabled,
                        values = profile.values.len(),
                        path = %path.display(),
                        "loaded profile"
                    );
                    store.results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded {
                            id: profile.id.clone(),
                        },
                    });
                    store.profiles.push(profile);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load profile");
                    store.results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(store)
    }

    /// Parse and validate a single profile file.
    pub fn load_file(path: &Path) -> Result<Profile> {
        let contents = fs::read_to_string(path)?;
        let file: ProfileFile =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let text: ValueText = serde_yaml::from_str(&contents).unwrap_or_default();
        file.into_profile(path, &text)
    }

    /// Build a store from in-memory profiles, rejecting duplicate ids.
    pub fn from_profiles(profiles: impl IntoIterator<Item = Profile>) -> Result<Self> {
        let mut store = Self::default();
        for profile in profiles {
            let source = profile.source.clone();
            let profile = store.check_unique(profile, &source)?;
            store.profiles.push(profile);
        }
        Ok(store)
    }

    fn check_unique(&self, profile: Profile, path: &Path) -> Result<Profile> {
        match self.profiles.iter().find(|p| p.id == profile.id) {
            Some(first) => Err(ConfigError::Duplicate {
                id: profile.id,
                path: path.to_path_buf(),
                first: first.source.clone(),
            }),
            None => Ok(profile),
        }
    }

    /// Look up a profile by id.
    pub fn get(&self, id: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ConfigError::NotFound(id.to_string()))
    }

    /// All successfully loaded profiles, in load order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter().filter(|p| p.enabled)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Per-file outcomes, including skipped and failed files.
    pub fn load_results(&self) -> &[LoadResult] {
        &self.results
    }

    pub fn failures(&self) -> impl Iterator<Item = &LoadResult> {
        self.results.iter().filter(|r| r.is_failed())
    }
}

fn skipped(path: PathBuf, reason: &str) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}
