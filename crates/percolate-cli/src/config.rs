//! Configuration management for the percolate CLI.

use anyhow::{Context, Result};
use percolate::prelude::SpectralConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "percolate.toml";

/// Experiment configuration, read from `percolate.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub attack: AttackConfig,
    #[serde(default)]
    pub percolation: PercolationSection,
    #[serde(default)]
    pub spectral: SpectralConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_family")]
    pub family: String,
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default = "default_p")]
    pub p: f64,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_m")]
    pub m: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Seeds both graph generation and the random attack.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub weighted: bool,
    #[serde(default = "default_true")]
    pub use_undirected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercolationSection {
    #[serde(default)]
    pub num_steps: Option<usize>,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub weighted_paths: bool,
    #[serde(default = "default_kirchhoff_max_n")]
    pub kirchhoff_max_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_format")]
    pub format: String,
}

// Default value functions
fn default_family() -> String { "erdos_renyi".to_string() }
fn default_n() -> usize { 100 }
fn default_p() -> f64 { 0.05 }
fn default_k() -> usize { 4 }
fn default_m() -> usize { 3 }
fn default_strategy() -> String { "random".to_string() }
fn default_true() -> bool { true }
fn default_kind() -> String { "weak".to_string() }
fn default_kirchhoff_max_n() -> usize { 1000 }
fn default_output_path() -> String { "results.csv".to_string() }
fn default_format() -> String { "csv".to_string() }

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            family: default_family(),
            n: default_n(),
            p: default_p(),
            k: default_k(),
            m: default_m(),
        }
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            seed: None,
            weighted: false,
            use_undirected: default_true(),
        }
    }
}

impl Default for PercolationSection {
    fn default() -> Self {
        Self {
            num_steps: None,
            kind: default_kind(),
            weighted_paths: false,
            kirchhoff_max_n: default_kirchhoff_max_n(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: default_format(),
        }
    }
}

impl Config {
    /// Load config from percolate.toml in the current or parent directories.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::from_path(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Find percolate.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
