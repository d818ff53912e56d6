//! [`RuleTemplateSet`]: directory-backed, deterministically ordered fragments.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::load::{is_dotfile, is_yaml, LoadResult, LoadStatus};

use super::error::{Result, TemplateError};
use super::glob::CategoryGlob;
use super::parse::ParsedTemplate;

/// One alert-rule template, before any profile is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFragment {
    /// `<category>/<name>`, unique across the set.
    pub id: String,
    /// File stem, e.g. `app-not-synced`.
    pub name: String,
    /// Environment-independent category path, e.g. `backend/argo-applications`.
    pub category: String,
    /// Source file the fragment was read from.
    pub path: PathBuf,
    pub template: ParsedTemplate,
}

/// Ordered set of fragments loaded from a templates directory tree.
///
/// A fragment's category is its parent directory relative to the root, so
/// `templates/backend/argo-applications/app-not-synced.yaml` has category
/// `backend/argo-applications` and id `backend/argo-applications/app-not-synced`.
#[derive(Debug)]
pub struct RuleTemplateSet {
    root: PathBuf,
    glob: CategoryGlob,
    fragments: Vec<TemplateFragment>,
    results: Vec<LoadResult>,
}

impl RuleTemplateSet {
    /// Load every fragment under `root` whose category matches `category_glob`.
    ///
    /// Malformed fragments are reported per file in [`load_results`] and do
    /// not abort the load. Only a missing root or an invalid glob is fatal.
    ///
    /// [`load_results`]: RuleTemplateSet::load_results
    pub fn load(root: &Path, category_glob: &str) -> Result<Self> {
        let glob = CategoryGlob::new(category_glob).map_err(|reason| TemplateError::InvalidGlob {
            pattern: category_glob.to_string(),
            reason,
        })?;
        if !root.is_dir() {
            return Err(TemplateError::MissingDirectory(root.to_path_buf()));
        }

        let mut paths = Vec::new();
        let mut results = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            // Never descend into dot-directories; report nothing for them.
            .filter_entry(|e| e.depth() == 0 || !is_dotfile(e.path()) || e.file_type().is_file());

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if is_dotfile(&path) {
                results.push(skipped(path, "dotfile"));
            } else if !is_yaml(&path) {
                results.push(skipped(path, "not a YAML file"));
            } else {
                paths.push(path);
            }
        }

        let mut candidates = Vec::new();
        for path in paths {
            match fragment_location(root, &path) {
                Ok((category, name)) => {
                    if glob.matches(&category) {
                        candidates.push((category, name, path));
                    } else {
                        debug!(path = %path.display(), category = %category, "category filtered out");
                        results.push(skipped(path, "category does not match glob"));
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load template fragment");
                    results.push(failed(path, &e));
                }
            }
        }

        // Category path, then filename: independent of walk order quirks.
        candidates.sort_by(|a, b| {
            (a.0.as_str(), file_name(&a.2)).cmp(&(b.0.as_str(), file_name(&b.2)))
        });

        let mut fragments: Vec<TemplateFragment> = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        for (category, name, path) in candidates {
            let id = format!("{category}/{name}");
            if let Some(first) = seen.get(&id) {
                let e = TemplateError::Duplicate {
                    id,
                    path: path.clone(),
                    first: first.clone(),
                };
                warn!(error = %e, "failed to load template fragment");
                results.push(failed(path, &e));
                continue;
            }

            match Self::parse_file(&path) {
                Ok(template) => {
                    info!(fragment = %id, variables = template.variables().len(), path = %path.display(), "loaded template fragment");
                    seen.insert(id.clone(), path.clone());
                    results.push(LoadResult {
                        path: path.clone(),
                        status: LoadStatus::Loaded { id: id.clone() },
                    });
                    fragments.push(TemplateFragment {
                        id,
                        name,
                        category,
                        path,
                        template,
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load template fragment");
                    results.push(failed(path, &e));
                }
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            glob,
            fragments,
            results,
        })
    }

    /// Read and parse one fragment file.
    pub fn parse_file(path: &Path) -> Result<ParsedTemplate> {
        let contents = fs::read_to_string(path)?;
        ParsedTemplate::parse(&contents).map_err(|detail| TemplateError::Syntax {
            path: path.to_path_buf(),
            detail,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn glob(&self) -> &CategoryGlob {
        &self.glob
    }

    /// Fragments ordered by category path, then filename.
    pub fn fragments(&self) -> &[TemplateFragment] {
        &self.fragments
    }

    pub fn get(&self, id: &str) -> Option<&TemplateFragment> {
        self.fragments.iter().find(|f| f.id == id)
    }

    /// Per-file outcomes, including skipped and failed files.
    pub fn load_results(&self) -> &[LoadResult] {
        &self.results
    }

    pub fn failures(&self) -> impl Iterator<Item = &LoadResult> {
        self.results.iter().filter(|r| r.is_failed())
    }
}

/// Split a fragment path into (category, name) relative to `root`.
fn fragment_location(root: &Path, path: &Path) -> Result<(String, String)> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TemplateError::BadName(path.to_path_buf()))?
        .to_string();

    let parent = path
        .parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .ok_or_else(|| TemplateError::BadName(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in parent.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| TemplateError::BadName(path.to_path_buf()))?;
        parts.push(part);
    }
    if parts.is_empty() {
        return Err(TemplateError::EmptyCategory(path.to_path_buf()));
    }
    Ok((parts.join("/"), name))
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn skipped(path: PathBuf, reason: &str) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}

fn failed(path: PathBuf, error: &TemplateError) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Failed {
            error: error.to_string(),
        },
    }
}
