use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::depth::DEFAULT_MAX_DEPTH_WARN;

pub const CONFIG_FILE: &str = "skill-factory.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Chains at or beyond this depth are flagged (default: 3)
    #[serde(default = "default_max_depth_warn")]
    pub max_depth_warn: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_depth_warn: default_max_depth_warn(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// ANSI colors in reports (default: true)
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintConfig {
    /// Treat warnings as errors
    #[serde(default)]
    pub strict: bool,

    /// Descriptions shorter than this hurt trigger accuracy (default: 20)
    #[serde(default = "default_min_description_len")]
    pub min_description_len: usize,

    /// Team names plugin.json may declare
    #[serde(default = "default_known_teams")]
    pub known_teams: Vec<String>,

    /// `Read:`/`Glob:` references under these prefixes are generated at run
    /// time and are not checked for existence
    #[serde(default = "default_runtime_path_prefixes")]
    pub runtime_path_prefixes: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            strict: false,
            min_description_len: default_min_description_len(),
            known_teams: default_known_teams(),
            runtime_path_prefixes: default_runtime_path_prefixes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_file")]
    pub registry_file: String,

    #[serde(default = "default_readme_file")]
    pub readme_file: String,

    /// Model shown when a document does not declare one
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_version")]
    pub default_version: String,

    /// Execution style per team for the README teams table
    #[serde(default = "default_team_execution")]
    pub team_execution: BTreeMap<String, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_file: default_registry_file(),
            readme_file: default_readme_file(),
            default_model: default_model(),
            default_version: default_version(),
            team_execution: default_team_execution(),
        }
    }
}

fn default_max_depth_warn() -> usize {
    DEFAULT_MAX_DEPTH_WARN
}

fn default_true() -> bool {
    true
}

fn default_min_description_len() -> usize {
    20
}

fn default_known_teams() -> Vec<String> {
    ["review-team", "quality-team", "commit-team", "feature-team"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_runtime_path_prefixes() -> Vec<String> {
    vec![
        "project-context/".to_string(),
        ".skill-factory-context".to_string(),
    ]
}

fn default_registry_file() -> String {
    "registry.md".to_string()
}

fn default_readme_file() -> String {
    "README.md".to_string()
}

fn default_model() -> String {
    "sonnet".to_string()
}

fn default_version() -> String {
    "v1.0".to_string()
}

fn default_team_execution() -> BTreeMap<String, String> {
    [
        ("review-team", "**Parallel**"),
        ("quality-team", "**Sequential**"),
        ("commit-team", "**Sequential**"),
        ("feature-team", "**Gated**"),
    ]
    .iter()
    .map(|(team, style)| (team.to_string(), style.to_string()))
    .collect()
}

impl Config {
    /// Load configuration for a factory root.
    /// Order: explicit path, `<root>/skill-factory.toml`, user config dir, defaults.
    pub fn load(root: &Path, path: Option<&str>) -> Result<Self> {
        // An explicit path must exist and parse
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(config_path)
                .with_context(|| format!("Failed to load config from {}", config_path));
        }

        let local = root.join(CONFIG_FILE);
        if local.is_file() {
            debug!("Loading config from {}", local.display());
            return Self::load_from_path(&local)
                .with_context(|| format!("Failed to load config from {}", local.display()));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("skill-factory").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
