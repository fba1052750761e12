//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod generate;
mod project;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{load_config, ConfigError};

pub use project::ProjectAction;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Spritegen - pack images into a grid sprite sheet
#[derive(Parser)]
#[command(name = "spritegen")]
#[command(about = "Spritegen - pack images into a grid sprite sheet (PNG + optional JSON metadata)")]
#[command(version)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG also applies.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a spritegen.toml (default: search upwards from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a sprite sheet from images and/or a project file
    Generate {
        /// Input images, in sheet order. Appended to the project's inputs
        /// when --project is given.
        inputs: Vec<PathBuf>,

        /// Project file (.xml) to read settings and inputs from
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Output image. `dir/file.png` sets both directory and file name;
        /// `dir/` keeps the file name (default: ./SpriteSheet.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of grid columns (>= 1)
        #[arg(short, long, allow_negative_numbers = true)]
        columns: Option<i64>,

        /// Also write a JSON metadata sidecar
        #[arg(short, long)]
        metadata: bool,

        /// Fail instead of replacing existing output files
        #[arg(long)]
        no_overwrite: bool,

        /// Canvas background as hex (#RGB, #RGBA, #RRGGBB, #RRGGBBAA)
        #[arg(long)]
        background: Option<String>,

        /// Parallel decode jobs (0 = all cores, 1 = sequential)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Create the output directory if it does not exist
        #[arg(long)]
        create_dirs: bool,

        /// Save the effective settings as a project file
        #[arg(long, value_name = "FILE")]
        save_project: Option<PathBuf>,
    },

    /// Create and edit project files
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            inputs,
            project,
            output,
            columns,
            metadata,
            no_overwrite,
            background,
            jobs,
            create_dirs,
            save_project,
        } => {
            let config = match load_config(cli.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return ExitCode::from(config_exit_code(&e));
                }
            };
            generate::run_generate(generate::GenerateArgs {
                inputs,
                project,
                output,
                columns,
                metadata,
                overwrite: !no_overwrite,
                background,
                jobs,
                create_dirs,
                save_project,
                config,
            })
        }
        Commands::Project { action } => project::run_project(action),
    }
}

/// A config file that cannot be read is an error; one that is malformed or
/// invalid counts as bad arguments.
pub(crate) fn config_exit_code(error: &ConfigError) -> u8 {
    match error {
        ConfigError::Io(_) => EXIT_ERROR,
        ConfigError::Parse(_) | ConfigError::Validation(_) => EXIT_INVALID_ARGS,
    }
}

/// Initialize `env_logger` for the given `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}
