//! PNG encoding and atomic file output
//!
//! Every file is first written to a temporary sibling in the destination
//! directory and then renamed over the target, so a failed write never
//! leaves a truncated file behind.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode an RGBA image as PNG bytes.
///
/// The encoder writes no timestamps or other ancillary chunks, so equal
/// images always encode to equal bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, OutputError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// File contents written to a temporary file next to their final location.
///
/// Dropping a `StagedFile` without committing removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Write `bytes` to a temp file in `target`'s directory.
    pub fn stage(target: &Path, bytes: &[u8]) -> Result<Self, OutputError> {
        let mut temp = tempfile::Builder::new()
            .prefix(".spritegen-")
            .suffix(".tmp")
            .tempfile_in(parent_dir(target))?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        Ok(Self { temp, target: target.to_path_buf() })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the staged file into place.
    ///
    /// With `overwrite` false an existing target is an `AlreadyExists` error.
    pub fn commit(self, overwrite: bool) -> Result<File, OutputError> {
        let result = if overwrite {
            self.temp.persist(&self.target)
        } else {
            self.temp.persist_noclobber(&self.target)
        };
        // On failure the returned temp file is dropped and deleted here
        result.map_err(|e| OutputError::Io(e.error))
    }
}

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    StagedFile::stage(path, bytes)?.commit(true)?;
    Ok(())
}

/// An existing file moved aside while its replacement is written.
///
/// Dropping a `Backup` deletes the old contents; `restore` puts them back.
#[derive(Debug)]
pub struct Backup {
    temp: TempPath,
    original: PathBuf,
}

impl Backup {
    /// Move the file at `path` to a temporary sibling. Returns `None` when
    /// there is no regular file there.
    pub fn take(path: &Path) -> Result<Option<Self>, OutputError> {
        if !path.is_file() {
            return Ok(None);
        }

        let temp = tempfile::Builder::new()
            .prefix(".spritegen-")
            .suffix(".bak")
            .tempfile_in(parent_dir(path))?
            .into_temp_path();
        fs::rename(path, &temp)?;

        Ok(Some(Self { temp, original: path.to_path_buf() }))
    }

    /// Move the old contents back, replacing whatever is at the path now.
    pub fn restore(self) -> Result<(), OutputError> {
        self.temp.persist(&self.original).map_err(|e| OutputError::Io(e.error))
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Split a `dir/file.png` output argument into directory and file name.
///
/// A bare file name maps to the current directory; a path ending in a
/// separator (or naming an existing directory) gets `default_file`.
pub fn split_output_path(output: &Path, default_file: &str) -> (PathBuf, String) {
    let is_dir = output.as_os_str().to_string_lossy().ends_with(['/', '\\']) || output.is_dir();
    if is_dir {
        return (output.to_path_buf(), default_file.to_string());
    }

    let file = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| default_file.to_string());
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (dir, file)
}
