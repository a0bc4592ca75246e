//! Configuration file parsing (classreach.toml)
//!
//! ```toml
//! [search]
//! entries = ["build/classes", "libs/guava.jar"]
//!
//! [filter]
//! platform-prefixes = ["java."]
//! include = []
//! exclude = ["org.slf4j."]
//! max-modules = 5000
//! ```
//!
//! Relative search entries resolve against the directory holding the file.

use crate::acceptor::CollectingAcceptor;
use crate::search_path::SearchPath;
use classreach_classfile::{ReferenceExtractor, DEFAULT_PLATFORM_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Conventional configuration file name
pub const CONFIG_FILE_NAME: &str = "classreach.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Parsed configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Where modules are looked up
    #[serde(default)]
    pub search: SearchConfig,

    /// What is extracted and accepted
    #[serde(default)]
    pub filter: FilterConfig,

    /// Directory relative search entries resolve against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// `[search]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Directories and archives, in search order
    #[serde(default)]
    pub entries: Vec<String>,
}

/// `[filter]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Dotted prefixes dropped at extraction
    #[serde(default = "default_platform_prefixes")]
    pub platform_prefixes: Vec<String>,

    /// Accepted-name prefixes; empty accepts everything
    #[serde(default)]
    pub include: Vec<String>,

    /// Never-accepted name prefixes
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Cap on the number of accepted modules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_modules: Option<usize>,
}

fn default_platform_prefixes() -> Vec<String> {
    vec![DEFAULT_PLATFORM_PREFIX.to_string()]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            platform_prefixes: default_platform_prefixes(),
            include: Vec::new(),
            exclude: Vec::new(),
            max_modules: None,
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration from a string
    ///
    /// Relative entries resolve against the current directory.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.entries.iter().any(|entry| entry.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "Search entries cannot be empty".to_string(),
            ));
        }
        if self.filter.platform_prefixes.iter().any(String::is_empty) {
            return Err(ConfigError::ValidationError(
                "Platform prefixes cannot be empty; use an empty list to keep every name"
                    .to_string(),
            ));
        }
        if self.filter.max_modules == Some(0) {
            return Err(ConfigError::ValidationError(
                "max-modules must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory relative entries resolve against, if loaded from a file
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Search entries as paths, relative ones joined onto the base directory
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.search
            .entries
            .iter()
            .map(|entry| {
                let path = Path::new(entry);
                match &self.base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path.to_path_buf(),
                }
            })
            .collect()
    }

    /// Build the search path
    pub fn search_path(&self) -> SearchPath {
        SearchPath::from_paths(self.search_paths())
    }

    /// Build the reference extractor
    pub fn extractor(&self) -> ReferenceExtractor {
        ReferenceExtractor::with_platform_prefixes(&self.filter.platform_prefixes)
    }

    /// Build a collecting acceptor from the filter settings
    pub fn acceptor(&self) -> CollectingAcceptor {
        CollectingAcceptor::new()
            .with_include(self.filter.include.iter().cloned())
            .with_exclude(self.filter.exclude.iter().cloned())
            .with_max_modules(self.filter.max_modules)
    }
}
