//! Configuration module for spritegen
//!
//! Provides types and loading for `spritegen.toml` tool configuration.

pub mod loader;
pub mod schema;

pub use loader::{load_config, merge_cli_overrides, CliOverrides, ConfigError};
pub use schema::*;
