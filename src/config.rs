//! Analysis configuration
//!
//! Every field has a default, so an empty file (or no file) reproduces the
//! stock behavior.

use crate::recommend::RecommendationThresholds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options controlling one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Populate `modules` from module args
    pub include_modules: bool,
    /// Recommendation rule thresholds
    pub thresholds: RecommendationThresholds,
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read or has invalid TOML syntax.
    ///
    /// # Example TOML
    /// ```toml
    /// include_modules = true
    ///
    /// [thresholds]
    /// dataloader_percent = 5.0
    /// gpu_utilization_percent = 70.0
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML analysis config")
    }
}
