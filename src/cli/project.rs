//! Project command implementation

use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::output::split_output_path;
use crate::project::{SpritesheetProject, DEFAULT_OUTPUT_FILE};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project file
    New {
        /// Project file to create
        file: PathBuf,

        /// Output image path (default: ./SpriteSheet.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of grid columns
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        columns: i32,

        /// Write a JSON metadata sidecar when generating
        #[arg(short, long)]
        metadata: bool,

        /// Replace an existing project file
        #[arg(short, long)]
        force: bool,
    },

    /// Append input images (glob patterns are expanded)
    Add {
        /// Project file
        file: PathBuf,

        /// Image paths or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Remove input images
    Remove {
        /// Project file
        file: PathBuf,

        /// Image paths as listed in the project
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Change output settings
    Set {
        /// Project file
        file: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of grid columns
        #[arg(short, long, allow_negative_numbers = true)]
        columns: Option<i32>,

        /// Whether to write a JSON metadata sidecar
        #[arg(short, long)]
        metadata: Option<bool>,
    },

    /// Print a project file
    Show {
        /// Project file
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run a project subcommand
pub fn run_project(action: ProjectAction) -> ExitCode {
    let code = match action {
        ProjectAction::New { file, output, columns, metadata, force } => {
            run_new(&file, output.as_deref(), columns, metadata, force)
        }
        ProjectAction::Add { file, paths } => run_add(&file, &paths),
        ProjectAction::Remove { file, paths } => run_remove(&file, &paths),
        ProjectAction::Set { file, output, columns, metadata } => {
            run_set(&file, output.as_deref(), columns, metadata)
        }
        ProjectAction::Show { file, json } => run_show(&file, json),
    };
    ExitCode::from(code)
}

fn run_new(
    file: &Path,
    output: Option<&Path>,
    columns: i32,
    metadata: bool,
    force: bool,
) -> u8 {
    if file.exists() && !force {
        eprintln!("Error: {} already exists (use --force to replace it)", file.display());
        return EXIT_INVALID_ARGS;
    }

    let (output_directory, output_file) = match output {
        Some(output) => split_output_path(output, DEFAULT_OUTPUT_FILE),
        None => (PathBuf::from("."), DEFAULT_OUTPUT_FILE.to_string()),
    };
    let project = SpritesheetProject {
        output_directory,
        output_file,
        columns,
        include_metadata: metadata,
        ..SpritesheetProject::new()
    };

    if let Err(e) = project.save(file) {
        eprintln!("Error: {}", e);
        return EXIT_ERROR;
    }
    println!("Created {}", file.display());
    EXIT_SUCCESS
}

fn run_add(file: &Path, patterns: &[String]) -> u8 {
    edit_project(file, |project| {
        let mut added = 0;
        for pattern in patterns {
            let paths = match expand_pattern(pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Err(EXIT_INVALID_ARGS);
                }
            };
            if paths.is_empty() {
                log::warn!("Pattern '{}' matched no files", pattern);
            }
            for path in paths {
                if project.add_input(path.clone()) {
                    added += 1;
                } else {
                    log::info!("Already listed: {}", path.display());
                }
            }
        }
        println!("Added {} input(s), {} total", added, project.input_paths.len());
        Ok(())
    })
}

fn run_remove(file: &Path, paths: &[PathBuf]) -> u8 {
    edit_project(file, |project| {
        let mut removed = 0;
        for path in paths {
            if project.remove_input(path) {
                removed += 1;
            } else {
                log::warn!("Not listed: {}", path.display());
            }
        }
        println!("Removed {} input(s), {} remaining", removed, project.input_paths.len());
        Ok(())
    })
}

fn run_set(
    file: &Path,
    output: Option<&Path>,
    columns: Option<i32>,
    metadata: Option<bool>,
) -> u8 {
    if output.is_none() && columns.is_none() && metadata.is_none() {
        eprintln!("Error: nothing to set (use --output, --columns or --metadata)");
        return EXIT_INVALID_ARGS;
    }

    edit_project(file, |project| {
        if let Some(output) = output {
            let default_file = if project.output_file.is_empty() {
                DEFAULT_OUTPUT_FILE.to_string()
            } else {
                project.output_file.clone()
            };
            let (dir, name) = split_output_path(output, &default_file);
            project.output_directory = dir;
            project.output_file = name;
        }
        if let Some(columns) = columns {
            project.columns = columns;
        }
        if let Some(metadata) = metadata {
            project.include_metadata = metadata;
        }
        println!("Updated {}", file.display());
        Ok(())
    })
}

fn run_show(file: &Path, json: bool) -> u8 {
    let project = match SpritesheetProject::load(file) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_ERROR;
        }
    };

    if json {
        let value = serde_json::json!({
            "inputs": project.input_paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "output_directory": project.output_directory.display().to_string(),
            "output_file": project.output_file,
            "columns": project.columns,
            "include_metadata": project.include_metadata,
        });
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_ERROR;
            }
        }
    } else {
        println!("Output:   {}", project.output_path().display());
        println!("Columns:  {}", project.columns);
        println!("Metadata: {}", if project.include_metadata { "yes" } else { "no" });
        println!("Inputs ({}):", project.input_paths.len());
        for (i, path) in project.input_paths.iter().enumerate() {
            println!("  {:>3}  {}", i, path.display());
        }
    }
    EXIT_SUCCESS
}

/// Load, modify and save a project file. The closure returns an exit code
/// on failure, in which case nothing is written.
fn edit_project(
    file: &Path,
    edit: impl FnOnce(&mut SpritesheetProject) -> Result<(), u8>,
) -> u8 {
    let mut project = match SpritesheetProject::load(file) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_ERROR;
        }
    };

    if let Err(code) = edit(&mut project) {
        return code;
    }

    if let Err(e) = project.save(file) {
        eprintln!("Error: {}", e);
        return EXIT_ERROR;
    }
    EXIT_SUCCESS
}

/// Expand a glob pattern into sorted file paths. A plain path is returned
/// as-is even when it does not exist, so it fails loudly at generation.
fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, glob::PatternError> {
    if !pattern.contains(['*', '?', '[']) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let mut paths: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .collect();
    paths.sort();
    Ok(paths)
}
