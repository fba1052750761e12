//! Spritegen - pack images into a grid sprite sheet
//!
//! This library provides functionality to:
//! - Decode a list of images (in parallel) and lay them out in a fixed-column grid
//! - Compose them into a single PNG, written atomically
//! - Describe every sprite's placement in an optional JSON sidecar
//! - Load and save XML project files holding the sheet configuration

pub mod cli;
pub mod color;
pub mod config;
pub mod decode;
pub mod generate;
pub mod layout;
pub mod metadata;
pub mod output;
pub mod project;
pub mod spritesheet;

pub use generate::{generate, GenerateError, GenerateReport};
pub use project::SpritesheetProject;
