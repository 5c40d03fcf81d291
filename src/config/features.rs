//! Optional feature declarations (`conf/features.toml`).
//!
//! ```toml
//! [[feature]]
//! key = "RealTime"
//! name = "Real Time Simulator"
//! depends = ["Threading", "librt"]
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::toml_loader::load_config;
use crate::error::ManifestError;

/// One declared optional feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Unique key, referenced by other features and modules.
    pub key: String,
    /// Human-readable name; defaults to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Check ids and feature keys, in declaration order.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Disabled unless explicitly enabled.
    #[serde(default)]
    pub opt_in: bool,
    /// Check whose detail becomes the payload when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_from: Option<String>,
    /// Static payload when enabled and no `payload_from` detail exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Preprocessor symbol; defaults to `ENABLE_<KEY>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub define: Option<String>,
}

impl FeatureSpec {
    /// Build a feature programmatically.
    #[must_use]
    pub fn new<I, S>(key: impl Into<String>, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            name: None,
            depends: depends.into_iter().map(Into::into).collect(),
            opt_in: false,
            payload_from: None,
            payload: None,
            define: None,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }

    /// Preprocessor symbol defined when the feature is enabled.
    #[must_use]
    pub fn define_symbol(&self) -> String {
        self.define
            .clone()
            .unwrap_or_else(|| format!("ENABLE_{}", screaming_snake(&self.key)))
    }
}

/// Convert `RealTime`, `real-time` or `realTime` to `REAL_TIME`.
#[must_use]
pub fn screaming_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                out.push('_');
            }
            out.push(c.to_ascii_uppercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
        prev = Some(c);
    }
    out
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeaturesFile {
    feature: Vec<FeatureSpec>,
}

/// Load features from `path` in declaration order.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<FeatureSpec>, ManifestError> {
    let file: FeaturesFile = load_config(path)?;
    Ok(file.feature)
}
