//! Profile types and the on-disk profile file format.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::template::is_identifier;

use super::error::{ConfigError, Result};

/// A scalar profile value.
///
/// Numbers keep the text they were written with, so `1.0` or `0.50` reach
/// the rendered fragment exactly as they appear in the profile file.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileValue {
    String(String),
    Bool(bool),
    Int { value: i64, text: String },
    Float { value: f64, text: String },
}

impl ProfileValue {
    fn number(n: &serde_yaml::Number, text: Option<&str>) -> Self {
        let text = text.map_or_else(|| n.to_string(), str::to_string);
        match n.as_i64() {
            Some(value) => ProfileValue::Int { value, text },
            None => ProfileValue::Float {
                value: n.as_f64().unwrap_or(f64::NAN),
                text,
            },
        }
    }
}

impl Serialize for ProfileValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ProfileValue::String(s) => serializer.serialize_str(s),
            ProfileValue::Bool(b) => serializer.serialize_bool(*b),
            ProfileValue::Int { value, .. } => serializer.serialize_i64(*value),
            ProfileValue::Float { value, .. } => serializer.serialize_f64(*value),
        }
    }
}

impl fmt::Display for ProfileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileValue::String(s) => f.write_str(s),
            ProfileValue::Bool(b) => write!(f, "{b}"),
            ProfileValue::Int { text, .. } | ProfileValue::Float { text, .. } => f.write_str(text),
        }
    }
}

impl From<&str> for ProfileValue {
    fn from(s: &str) -> Self {
        ProfileValue::String(s.to_string())
    }
}

impl From<bool> for ProfileValue {
    fn from(b: bool) -> Self {
        ProfileValue::Bool(b)
    }
}

impl From<i64> for ProfileValue {
    fn from(i: i64) -> Self {
        ProfileValue::number(&i.into(), None)
    }
}

impl From<f64> for ProfileValue {
    fn from(x: f64) -> Self {
        ProfileValue::number(&x.into(), None)
    }
}

/// A named environment profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    /// Unique identifier, e.g. `prod`.
    pub id: String,
    pub enabled: bool,
    /// Destination folder / routing key for this profile's rules.
    pub folder: String,
    /// Labels attached to every rule generated for this profile.
    pub labels: IndexMap<String, String>,
    /// Values available to `{{ name }}` placeholders.
    pub values: IndexMap<String, ProfileValue>,
    /// File the profile was loaded from (empty for in-memory profiles).
    pub source: PathBuf,
}

impl Profile {
    /// Build an enabled in-memory profile whose folder is its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            folder: id.clone(),
            id,
            enabled: true,
            labels: IndexMap::new(),
            values: IndexMap::new(),
            source: PathBuf::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ProfileValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn get(&self, key: &str) -> Option<&ProfileValue> {
        self.values.get(key)
    }

    /// Placeholder lookup: the value rendered as template text.
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.values.get(key).map(ToString::to_string)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Profile file as written on disk.
///
/// `enabled` and `values` stay loosely typed so the loader can report
/// "must be a boolean" / "must be a scalar" instead of a serde type error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ProfileFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    enabled: Option<serde_yaml::Value>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    labels: IndexMap<String, String>,
    #[serde(default)]
    values: IndexMap<String, serde_yaml::Value>,
}

/// The same file with every value read back as its source text.
///
/// Only parses when all values are scalars; numbers fall back to their
/// canonical form otherwise.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ValueText {
    #[serde(default)]
    values: IndexMap<String, String>,
}

impl ProfileFile {
    pub(super) fn into_profile(self, path: &Path, text: &ValueText) -> Result<Profile> {
        let id = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::MissingKey {
                path: path.to_path_buf(),
                key: "name",
            })?;
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid(
                path,
                "name",
                format!("'{id}' may only contain ASCII letters, digits, '-' and '_'"),
            ));
        }

        let enabled = match self.enabled {
            None => true,
            Some(serde_yaml::Value::Bool(b)) => b,
            Some(other) => {
                return Err(invalid(
                    path,
                    "enabled",
                    format!("must be a boolean, got {}", describe(&other)),
                ))
            }
        };

        let folder = match self.folder {
            Some(f) if f.trim().is_empty() => {
                return Err(invalid(path, "folder", "must not be empty".to_string()))
            }
            Some(f) => f,
            None => id.clone(),
        };

        let mut values = IndexMap::with_capacity(self.values.len());
        for (key, raw) in self.values {
            if !is_identifier(&key) {
                return Err(invalid(
                    path,
                    &format!("values.{key}"),
                    "keys must be identifiers ([A-Za-z_][A-Za-z0-9_]*) to be usable as placeholders"
                        .to_string(),
                ));
            }
            let value = scalar(&raw, text.values.get(&key).map(String::as_str)).ok_or_else(|| {
                invalid(
                    path,
                    &format!("values.{key}"),
                    format!("must be a string, boolean or number, got {}", describe(&raw)),
                )
            })?;
            if let ProfileValue::String(s) = &value {
                if let Some(c) = s.chars().find(|c| c.is_control()) {
                    return Err(invalid(
                        path,
                        &format!("values.{key}"),
                        format!("must be a single line without control characters, found {c:?}"),
                    ));
                }
            }
            values.insert(key, value);
        }

        Ok(Profile {
            id,
            enabled,
            folder,
            labels: self.labels,
            values,
            source: path.to_path_buf(),
        })
    }
}

fn scalar(value: &serde_yaml::Value, text: Option<&str>) -> Option<ProfileValue> {
    match value {
        serde_yaml::Value::String(s) => Some(ProfileValue::String(s.clone())),
        serde_yaml::Value::Bool(b) => Some(ProfileValue::Bool(*b)),
        serde_yaml::Value::Number(n) => Some(ProfileValue::number(n, text)),
        _ => None,
    }
}

fn describe(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

fn invalid(path: &Path, key: &str, message: String) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_path_buf(),
        key: key.to_string(),
        message,
    }
}
