//! Generate command implementation

use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{merge_cli_overrides, CliOverrides, SpritegenConfig};
use crate::generate::GenerateError;
use crate::output::split_output_path;
use crate::project::{SpritesheetProject, DEFAULT_OUTPUT_FILE};

use super::{config_exit_code, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Arguments of the generate command after parsing
pub struct GenerateArgs {
    pub inputs: Vec<PathBuf>,
    pub project: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub columns: Option<i64>,
    pub metadata: bool,
    pub overwrite: bool,
    pub background: Option<String>,
    pub jobs: Option<usize>,
    pub create_dirs: bool,
    pub save_project: Option<PathBuf>,
    pub config: SpritegenConfig,
}

/// Run the generate command
pub fn run_generate(args: GenerateArgs) -> ExitCode {
    let overrides = CliOverrides {
        background: args.background.clone(),
        jobs: args.jobs,
        create_dirs: args.create_dirs.then_some(true),
    };
    let config = match merge_cli_overrides(args.config.clone(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(config_exit_code(&e));
        }
    };

    let mut project = match &args.project {
        Some(path) => match SpritesheetProject::load(path) {
            Ok(project) => project,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => SpritesheetProject {
            output_directory: PathBuf::from("."),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            ..SpritesheetProject::new()
        },
    };

    let columns = apply_args(&mut project, &args);

    if let Some(path) = &args.save_project {
        if let Err(message) = check_storable_columns(columns) {
            eprintln!("Error: {}", message);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        if let Err(e) = project.save(path) {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
        println!("Saved project {}", path.display());
    }

    match crate::generate::generate(
        &project.input_paths,
        &project.output_directory,
        &project.output_file,
        columns,
        project.include_metadata,
        args.overwrite,
        &config,
    ) {
        Ok(report) => {
            println!(
                "Generated {} ({}x{}, {} sprites in {}x{} grid)",
                report.image_path.display(),
                report.metadata.size[0],
                report.metadata.size[1],
                report.metadata.sprites.len(),
                report.layout.columns(),
                report.layout.rows()
            );
            if let Some(path) = &report.metadata_path {
                println!("Metadata {}", path.display());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Fold command-line values into the project. Returns the column count to
/// use, which may not fit the project's `i32` field.
fn apply_args(project: &mut SpritesheetProject, args: &GenerateArgs) -> i64 {
    for input in &args.inputs {
        if !project.add_input(input.clone()) {
            log::warn!("Skipping duplicate input {}", input.display());
        }
    }

    if let Some(output) = &args.output {
        let default_file = if project.output_file.is_empty() {
            DEFAULT_OUTPUT_FILE
        } else {
            project.output_file.as_str()
        };
        let (dir, file) = split_output_path(output, default_file);
        project.output_directory = dir;
        project.output_file = file;
    }

    if args.metadata {
        project.include_metadata = true;
    }

    match args.columns {
        Some(columns) => {
            project.columns = i32::try_from(columns).unwrap_or(project.columns);
            columns
        }
        None => i64::from(project.columns),
    }
}

/// Project files store the column count as a 32-bit integer.
fn check_storable_columns(columns: i64) -> Result<(), String> {
    i32::try_from(columns)
        .map(|_| ())
        .map_err(|_| format!("columns {} cannot be stored in a project file", columns))
}

fn exit_code_for(error: &GenerateError) -> u8 {
    match error {
        GenerateError::InvalidConfiguration(_) | GenerateError::NoInputImages => EXIT_INVALID_ARGS,
        GenerateError::ImageDecode { .. } | GenerateError::OutputWrite { .. } => EXIT_ERROR,
    }
}
