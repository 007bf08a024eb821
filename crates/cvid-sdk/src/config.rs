//! Session configuration.

use std::path::Path;

use cvid_walk::StableModules;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings for one identity session, loadable from TOML.
///
/// ```toml
/// use_default_stable_modules = true
/// extra_stable_modules = ["mycompany"]
/// max_reported_unstable = 50
/// diff_column_width = 100
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Start from the built-in allow-list of stable module roots.
    pub use_default_stable_modules: bool,
    /// Further module roots whose contents are identified by name.
    pub extra_stable_modules: Vec<String>,
    /// Cap on detailed nodes in an instability report.
    pub max_reported_unstable: usize,
    /// Width of each column in instability report diffs.
    pub diff_column_width: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            use_default_stable_modules: true,
            extra_stable_modules: Vec::new(),
            max_reported_unstable: cvid_cache::DEFAULT_MAX_REPORTED,
            diff_column_width: cvid_diff::DEFAULT_COLUMN_WIDTH,
        }
    }
}

impl SessionConfig {
    /// A config whose only stable modules are the ones added explicitly.
    pub fn isolated() -> Self {
        Self {
            use_default_stable_modules: false,
            ..Self::default()
        }
    }

    pub fn with_stable_module(mut self, name: impl Into<String>) -> Self {
        self.extra_stable_modules.push(name.into());
        self
    }

    pub fn with_max_reported_unstable(mut self, max: usize) -> Self {
        self.max_reported_unstable = max;
        self
    }

    pub fn with_diff_column_width(mut self, width: usize) -> Self {
        self.diff_column_width = width;
        self
    }

    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// The stable-module allow-list this config describes.
    pub fn stable_modules(&self) -> StableModules {
        let mut stable = if self.use_default_stable_modules {
            StableModules::with_defaults()
        } else {
            StableModules::empty()
        };
        stable.extend(self.extra_stable_modules.iter().map(String::as_str));
        stable
    }
}
