//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use signal_mgr::GeneratorConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from signal-mgr.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Project files; each one is generated independently
    pub projects: Vec<PathBuf>,
    /// Lookup tables merged into every project before generation
    #[serde(default)]
    pub lookup_tables: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for generated files (default: next to each project)
    pub dir: Option<PathBuf>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.input.projects.is_empty() {
        bail!("Config file {:?} lists no projects under [input]", path);
    }
    if config.generator.file_stem.trim().is_empty() {
        bail!("Config file {:?}: generator.file_stem must not be empty", path);
    }

    Ok(config)
}
