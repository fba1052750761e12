//! Configuration schema types for `spritegen.toml`
//!
//! Tool-level settings that apply to every generation: canvas background,
//! metadata sidecar options, decode parallelism and output directory policy.
//! Per-sheet settings (inputs, columns, output file) live in project files.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::color::{parse_color, ColorError};

/// Canvas settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Background for unused cell area, as a hex color
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { background: default_background() }
    }
}

fn default_background() -> String {
    "#00000000".to_string()
}

/// Metadata sidecar settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// File extension of the sidecar (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Pretty-print the JSON document
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { extension: default_extension(), pretty: true }
    }
}

fn default_extension() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

/// Decode settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Parallel decode workers (0 = available parallelism, 1 = sequential)
    #[serde(default)]
    pub jobs: usize,
}

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Create a missing output directory instead of failing
    #[serde(default)]
    pub create_dirs: bool,
}

/// Root of `spritegen.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpritegenConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "canvas.background")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "spritegen.toml: '{}' {}", self.field, self.message)
    }
}

impl SpritegenConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = parse_color(&self.canvas.background) {
            errors.push(ConfigValidationError {
                field: "canvas.background".to_string(),
                message: format!("is not a hex color: {}", e),
            });
        }

        let extension = self.metadata.extension.trim_start_matches('.');
        if extension.is_empty() {
            errors.push(ConfigValidationError {
                field: "metadata.extension".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        } else if extension.contains(['/', '\\']) {
            errors.push(ConfigValidationError {
                field: "metadata.extension".to_string(),
                message: "must not contain path separators".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Parsed canvas background.
    pub fn background(&self) -> Result<Rgba<u8>, ColorError> {
        parse_color(&self.canvas.background)
    }
}
