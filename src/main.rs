//! Spritegen - command-line tool for packing images into a sprite sheet

use std::process::ExitCode;

use spritegen::cli;

fn main() -> ExitCode {
    cli::run()
}
