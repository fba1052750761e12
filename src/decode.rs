//! Source image decoding
//!
//! Inputs are decoded into RGBA8 buffers. Decoding is parallel across a
//! bounded rayon pool, but results always come back in input order and the
//! reported failure is the one with the lowest input index.

use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// A decoded input image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Path as given by the caller
    pub path: PathBuf,
    /// Pixels normalized to 8-bit RGBA
    pub image: RgbaImage,
    /// Detected container format, if known
    pub format: Option<ImageFormat>,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Display name: the file name, falling back to the whole path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A single input failed to decode.
#[derive(Debug, Error)]
#[error("failed to decode image '{}': {source}", path.display())]
pub struct DecodeError {
    /// Position of the input in the caller's list
    pub index: usize,
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// Decode one image from disk.
pub fn decode_image(path: &Path) -> Result<SourceImage, image::ImageError> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let image = reader.decode()?.to_rgba8();
    Ok(SourceImage { path: path.to_path_buf(), image, format })
}

/// Number of decode workers for a configured job count (0 = all cores).
pub fn effective_jobs(jobs: usize) -> usize {
    if jobs == 0 {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        jobs
    }
}

/// Decode every path in order. Fails fast.
///
/// With more than one job the work is spread over a dedicated pool. Once an
/// input fails, inputs after it are skipped; inputs before it are still
/// decoded so that the lowest failing index is the one reported.
pub fn decode_all(paths: &[PathBuf], jobs: usize) -> Result<Vec<SourceImage>, DecodeError> {
    let jobs = effective_jobs(jobs).min(paths.len().max(1));

    if jobs <= 1 {
        return paths
            .iter()
            .enumerate()
            .map(|(index, path)| decode_one(index, path))
            .collect();
    }

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("Could not start decode pool ({}), decoding sequentially", e);
            return decode_all(paths, 1);
        }
    };

    let first_failure = AtomicUsize::new(usize::MAX);

    let results: Vec<Option<Result<SourceImage, DecodeError>>> = pool.install(|| {
        paths
            .par_iter()
            .enumerate()
            .map(|(index, path)| {
                if index > first_failure.load(Ordering::Acquire) {
                    return None;
                }
                let result = decode_one(index, path);
                if result.is_err() {
                    first_failure.fetch_min(index, Ordering::AcqRel);
                }
                Some(result)
            })
            .collect()
    });

    // Skipped inputs always sit after a recorded failure
    results.into_iter().flatten().collect()
}

fn decode_one(index: usize, path: &Path) -> Result<SourceImage, DecodeError> {
    let image = decode_image(path).map_err(|source| DecodeError {
        index,
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "Decoded [{}] {} ({}x{}, {:?})",
        index,
        path.display(),
        image.width(),
        image.height(),
        image.format
    );
    Ok(image)
}
