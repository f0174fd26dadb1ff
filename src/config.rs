//! Configuration system
//!
//! Reads per-check settings from `.sleet.yml` at the project root; every
//! field defaults so a missing file means default configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checks::DEFAULT_MIN_CONSECUTIVE_STATEMENTS;

/// Name of the project-level configuration file.
pub const CONFIG_FILE: &str = ".sleet.yml";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings for the `LiquidTag` check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidTagConfig {
    pub enabled: bool,
    pub min_consecutive_statements: usize,
}

impl Default for LiquidTagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_consecutive_statements: DEFAULT_MIN_CONSECUTIVE_STATEMENTS,
        }
    }
}

/// Generic on/off toggle for checks without further settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckToggle {
    pub enabled: bool,
}

impl Default for CheckToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Project configuration, keyed by check name the way offenses report it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "LiquidTag")]
    pub liquid_tag: LiquidTagConfig,

    #[serde(rename = "SpaceInsideBraces")]
    pub space_inside_braces: CheckToggle,
}

impl Config {
    /// Parse configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load `.sleet.yml` from `root`, falling back to defaults when the
    /// file does not exist.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Self::from_yaml(&text)
    }
}
