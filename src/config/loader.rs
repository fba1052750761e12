//! Configuration loading and discovery for `spritegen.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::SpritegenConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the working tree
pub const CONFIG_FILE_NAME: &str = "spritegen.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse spritegen.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override canvas background color
    pub background: Option<String>,
    /// Override decode worker count
    pub jobs: Option<usize>,
    /// Override output directory creation
    pub create_dirs: Option<bool>,
}

/// Find spritegen.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for spritegen.toml
/// 2. Check XDG_CONFIG_HOME/spritegen/spritegen.toml (or ~/.config/spritegen/spritegen.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find spritegen.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("spritegen").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find spritegen.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a spritegen.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the defaults.
pub fn load_config(path: Option<&Path>) -> Result<SpritegenConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("Loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(SpritegenConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<SpritegenConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SpritegenConfig = toml::from_str(&contents)?;
    check(config)
}

fn check(config: SpritegenConfig) -> Result<SpritegenConfig, ConfigError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(config)
}

/// Merge CLI overrides into a configuration and re-validate it.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(
    mut config: SpritegenConfig,
    overrides: &CliOverrides,
) -> Result<SpritegenConfig, ConfigError> {
    if let Some(ref background) = overrides.background {
        config.canvas.background = background.clone();
    }

    if let Some(jobs) = overrides.jobs {
        config.decode.jobs = jobs;
    }

    if let Some(create_dirs) = overrides.create_dirs {
        config.output.create_dirs = create_dirs;
    }

    check(config)
}
