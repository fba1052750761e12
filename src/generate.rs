//! Sprite sheet generation
//!
//! Ties the pipeline together: validate, decode, lay out, compose, encode,
//! then write the sheet (and optionally its metadata sidecar) atomically.
//! A failed call leaves nothing behind in the output directory.
//!
//! # Example
//!
//! ```ignore
//! use spritegen::config::SpritegenConfig;
//! use spritegen::generate::generate;
//!
//! let inputs = vec!["idle.png".into(), "run.png".into()];
//! let report = generate(&inputs, "build".as_ref(), "hero.png", 2, true, true,
//!     &SpritegenConfig::default())?;
//! println!("{}x{}", report.metadata.size[0], report.metadata.size[1]);
//! ```

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::SpritegenConfig;
use crate::decode::{decode_all, SourceImage};
use crate::layout::{GridLayout, MAX_SHEET_BYTES};
use crate::metadata::{sidecar_name, SheetMetadata};
use crate::output::{encode_png, Backup, OutputError, StagedFile};
use crate::spritesheet::render_spritesheet;

/// Why a generation call failed. Nothing is written when any of these occur.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Bad column count, output location or config value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The input list was empty
    #[error("No input images were given")]
    NoInputImages,
    /// An input could not be read or decoded
    #[error("Failed to decode image '{}': {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        /// Position of the input in the list
        index: usize,
        #[source]
        source: image::ImageError,
    },
    /// The sheet or its sidecar could not be written
    #[error("Failed to write '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: OutputError,
    },
}

impl GenerateError {
    fn write(path: &Path, source: impl Into<OutputError>) -> Self {
        GenerateError::OutputWrite { path: path.to_path_buf(), source: source.into() }
    }
}

/// What a successful generation produced.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// Path of the written sheet image
    pub image_path: PathBuf,
    /// Path of the written sidecar, when metadata was requested
    pub metadata_path: Option<PathBuf>,
    pub layout: GridLayout,
    /// Placement of every sprite, in input order
    pub metadata: SheetMetadata,
}

/// Validated output settings for one call
struct Target {
    image_path: PathBuf,
    metadata_path: Option<PathBuf>,
}

/// Generate a sprite sheet.
///
/// Validation happens before any I/O: `columns` must be at least 1, there
/// must be at least one input, and the output location must name a plain
/// file inside a directory. Inputs are decoded all-or-nothing; the first
/// failing input (by position) is reported.
///
/// The sheet is written to `output_directory/output_file`. With
/// `include_metadata` a JSON sidecar with the same stem is written next to
/// it. With `overwrite` false, existing targets are an error.
pub fn generate(
    input_paths: &[PathBuf],
    output_directory: &Path,
    output_file: &str,
    columns: i64,
    include_metadata: bool,
    overwrite: bool,
    config: &SpritegenConfig,
) -> Result<GenerateReport, GenerateError> {
    let columns = u32::try_from(columns).ok().and_then(NonZeroU32::new).ok_or_else(|| {
        GenerateError::InvalidConfiguration(format!("columns must be at least 1, got {}", columns))
    })?;

    if input_paths.is_empty() {
        return Err(GenerateError::NoInputImages);
    }

    let background = config.background().map_err(|e| {
        GenerateError::InvalidConfiguration(format!("canvas background: {}", e))
    })?;
    let target = resolve_target(output_directory, output_file, include_metadata, config)?;

    if !overwrite {
        for path in std::iter::once(&target.image_path).chain(target.metadata_path.as_ref()) {
            if path.exists() {
                return Err(GenerateError::write(
                    path,
                    std::io::Error::new(std::io::ErrorKind::AlreadyExists, "file already exists"),
                ));
            }
        }
    }

    if !config.output.create_dirs && !output_directory.is_dir() {
        return Err(GenerateError::write(
            output_directory,
            std::io::Error::new(std::io::ErrorKind::NotFound, "output directory does not exist"),
        ));
    }

    let sources = decode_all(input_paths, config.decode.jobs).map_err(|e| {
        GenerateError::ImageDecode { path: e.path, index: e.index, source: e.source }
    })?;

    let sizes: Vec<(u32, u32)> = sources.iter().map(|s| (s.width(), s.height())).collect();
    let layout = GridLayout::compute(&sizes, columns).ok_or_else(|| {
        GenerateError::InvalidConfiguration(format!(
            "sheet would exceed the maximum size of {} MiB",
            MAX_SHEET_BYTES / (1024 * 1024)
        ))
    })?;
    log::debug!(
        "Layout: {} sprites, {}x{} grid, {}x{} cells",
        layout.len(),
        layout.columns(),
        layout.rows(),
        layout.cell_size().0,
        layout.cell_size().1
    );

    let (sheet, metadata) = compose(&sources, &layout, background, output_file.trim());
    drop(sources);

    let png = encode_png(&sheet).map_err(|e| GenerateError::write(&target.image_path, e))?;
    drop(sheet);

    let sidecar = match &target.metadata_path {
        Some(path) => {
            let json = metadata
                .to_json(config.metadata.pretty)
                .map_err(|e| GenerateError::write(path, std::io::Error::from(e)))?;
            Some((path.as_path(), json))
        }
        None => None,
    };

    if config.output.create_dirs {
        std::fs::create_dir_all(output_directory)
            .map_err(|e| GenerateError::write(output_directory, e))?;
    }

    write_outputs(&target.image_path, &png, sidecar, overwrite)?;

    log::info!(
        "Wrote {}x{} sheet with {} sprites to {}",
        metadata.size[0],
        metadata.size[1],
        metadata.sprites.len(),
        target.image_path.display()
    );

    Ok(GenerateReport {
        image_path: target.image_path,
        metadata_path: target.metadata_path,
        layout,
        metadata,
    })
}

fn resolve_target(
    output_directory: &Path,
    output_file: &str,
    include_metadata: bool,
    config: &SpritegenConfig,
) -> Result<Target, GenerateError> {
    if output_directory.as_os_str().is_empty() {
        return Err(GenerateError::InvalidConfiguration("output directory is empty".into()));
    }

    let file_name = output_file.trim();
    if file_name.is_empty() {
        return Err(GenerateError::InvalidConfiguration("output file name is empty".into()));
    }
    if file_name.contains(['/', '\\']) || file_name == "." || file_name == ".." {
        return Err(GenerateError::InvalidConfiguration(format!(
            "output file '{}' must be a file name, not a path",
            output_file
        )));
    }

    let image_path = output_directory.join(file_name);
    let metadata_path = if include_metadata {
        let name = sidecar_name(Path::new(file_name), &config.metadata.extension);
        if name == file_name {
            return Err(GenerateError::InvalidConfiguration(format!(
                "metadata sidecar '{}' would overwrite the sheet image",
                name
            )));
        }
        Some(output_directory.join(name))
    } else {
        None
    };

    Ok(Target { image_path, metadata_path })
}

fn compose(
    sources: &[SourceImage],
    layout: &GridLayout,
    background: image::Rgba<u8>,
    image_name: &str,
) -> (image::RgbaImage, SheetMetadata) {
    let metadata = SheetMetadata::new(image_name, layout, sources);
    let sheet = render_spritesheet(sources.iter().map(|s| &s.image), layout, background);
    (sheet, metadata)
}

/// Stage every file before committing any, so that the common failures
/// (permissions, disk full) happen while nothing is in place yet. When a
/// commit still fails, the previous sheet (if any) is put back.
fn write_outputs(
    image_path: &Path,
    png: &[u8],
    sidecar: Option<(&Path, String)>,
    overwrite: bool,
) -> Result<(), GenerateError> {
    let staged_image =
        StagedFile::stage(image_path, png).map_err(|e| GenerateError::write(image_path, e))?;
    let staged_sidecar = match &sidecar {
        Some((path, json)) => Some(
            StagedFile::stage(path, json.as_bytes()).map_err(|e| GenerateError::write(path, e))?,
        ),
        None => None,
    };

    let previous = match &staged_sidecar {
        Some(_) if overwrite => {
            Backup::take(image_path).map_err(|e| GenerateError::write(image_path, e))?
        }
        _ => None,
    };

    if let Err(e) = staged_image.commit(overwrite) {
        roll_back(image_path, previous, false);
        return Err(GenerateError::write(image_path, e));
    }

    if let Some(staged) = staged_sidecar {
        let path = staged.target().to_path_buf();
        if let Err(e) = staged.commit(overwrite) {
            roll_back(image_path, previous, true);
            return Err(GenerateError::write(&path, e));
        }
    }

    // Dropping the backup discards the replaced sheet
    drop(previous);
    Ok(())
}

/// Undo the image commit: restore the previous sheet, or remove the new one
/// when there was none.
fn roll_back(image_path: &Path, previous: Option<Backup>, committed: bool) {
    let result = match previous {
        Some(backup) => backup.restore(),
        None if committed => std::fs::remove_file(image_path).map_err(OutputError::from),
        None => Ok(()),
    };
    if let Err(e) = result {
        log::warn!("Could not roll back {} after failed write: {}", image_path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, color: Rgba<u8>) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, color).save(&path).unwrap();
        path
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_invalid_columns() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 2, 2, Rgba([1, 1, 1, 255]));
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        for columns in [0, -1, i64::from(u32::MAX) + 1] {
            let result = generate(
                &[input.clone()],
                &out,
                "sheet.png",
                columns,
                true,
                true,
                &SpritegenConfig::default(),
            );
            assert!(
                matches!(result, Err(GenerateError::InvalidConfiguration(_))),
                "columns={}",
                columns
            );
        }
        assert!(dir_entries(&out).is_empty());
    }

    #[test]
    fn test_columns_checked_before_inputs() {
        let dir = TempDir::new().unwrap();
        let result =
            generate(&[], dir.path(), "sheet.png", 0, false, true, &SpritegenConfig::default());
        assert!(matches!(result, Err(GenerateError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_no_inputs() {
        let dir = TempDir::new().unwrap();
        let result =
            generate(&[], dir.path(), "sheet.png", 2, false, true, &SpritegenConfig::default());
        assert!(matches!(result, Err(GenerateError::NoInputImages)));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_output_file_must_be_a_name() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 1, 1, Rgba([1, 1, 1, 255]));
        let config = SpritegenConfig::default();

        for name in ["", "  ", "nested/sheet.png", "..", "a\\b.png"] {
            let result = generate(&[input.clone()], dir.path(), name, 1, false, true, &config);
            assert!(
                matches!(result, Err(GenerateError::InvalidConfiguration(_))),
                "name={:?}",
                name
            );
        }

        let result = generate(&[input], Path::new(""), "sheet.png", 1, false, true, &config);
        assert!(matches!(result, Err(GenerateError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_sidecar_colliding_with_image_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 1, 1, Rgba([1, 1, 1, 255]));
        let result = generate(
            &[input],
            dir.path(),
            "sheet.json",
            1,
            true,
            true,
            &SpritegenConfig::default(),
        );
        assert!(matches!(result, Err(GenerateError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_background_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 1, 1, Rgba([1, 1, 1, 255]));
        let mut config = SpritegenConfig::default();
        config.canvas.background = "purple".to_string();

        let result = generate(&[input], dir.path(), "sheet.png", 1, false, true, &config);
        assert!(matches!(result, Err(GenerateError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_mixed_sizes_example() {
        let dir = TempDir::new().unwrap();
        let red = Rgba([255, 0, 0, 255]);
        let green = Rgba([0, 255, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        let inputs = vec![
            write_png(dir.path(), "a.png", 10, 10, red),
            write_png(dir.path(), "b.png", 20, 15, green),
            write_png(dir.path(), "c.png", 5, 5, blue),
        ];
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let report =
            generate(&inputs, &out, "sheet.png", 2, true, true, &SpritegenConfig::default())
                .unwrap();

        assert_eq!(report.layout.cell_size(), (20, 15));
        assert_eq!(report.layout.rows(), 2);
        assert_eq!(report.image_path, out.join("sheet.png"));
        assert_eq!(report.metadata_path, Some(out.join("sheet.json")));

        let sheet = image::open(&report.image_path).unwrap().to_rgba8();
        assert_eq!(sheet.dimensions(), (40, 30));
        assert_eq!(*sheet.get_pixel(0, 0), red);
        assert_eq!(*sheet.get_pixel(20, 0), green);
        assert_eq!(*sheet.get_pixel(0, 15), blue);
        // Outside the 5x5 sprite but inside its cell
        assert_eq!(*sheet.get_pixel(5, 15), Rgba([0, 0, 0, 0]));
        // Unused fourth cell
        assert_eq!(*sheet.get_pixel(39, 29), Rgba([0, 0, 0, 0]));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("sheet.json")).unwrap()).unwrap();
        let rects: Vec<[u64; 4]> = json["sprites"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| {
                [
                    s["x"].as_u64().unwrap(),
                    s["y"].as_u64().unwrap(),
                    s["w"].as_u64().unwrap(),
                    s["h"].as_u64().unwrap(),
                ]
            })
            .collect();
        assert_eq!(rects, vec![[0, 0, 10, 10], [20, 0, 20, 15], [0, 15, 5, 5]]);

        assert_eq!(dir_entries(&out), vec!["sheet.json", "sheet.png"]);
    }

    #[test]
    fn test_metadata_not_written_unless_requested() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 2, 2, Rgba([1, 1, 1, 255]));
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let report =
            generate(&[input], &out, "sheet.png", 1, false, true, &SpritegenConfig::default())
                .unwrap();
        assert_eq!(report.metadata_path, None);
        assert_eq!(report.metadata.sprites.len(), 1);
        assert_eq!(dir_entries(&out), vec!["sheet.png"]);
    }

    #[test]
    fn test_decode_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let good = write_png(dir.path(), "good.png", 2, 2, Rgba([1, 1, 1, 255]));
        let bad = dir.path().join("bad.png");
        fs::write(&bad, b"not a png").unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let err = generate(
            &[good.clone(), bad.clone(), good],
            &out,
            "sheet.png",
            2,
            true,
            true,
            &SpritegenConfig::default(),
        )
        .unwrap_err();

        match err {
            GenerateError::ImageDecode { path, index, .. } => {
                assert_eq!(path, bad);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(dir_entries(&out).is_empty());
    }

    #[test]
    fn test_missing_output_directory() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 2, 2, Rgba([1, 1, 1, 255]));
        let out = dir.path().join("missing");

        let err = generate(
            &[input.clone()],
            &out,
            "sheet.png",
            1,
            false,
            true,
            &SpritegenConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::OutputWrite { .. }));
        assert!(!out.exists());

        let mut config = SpritegenConfig::default();
        config.output.create_dirs = true;
        generate(&[input], &out, "sheet.png", 1, false, true, &config).unwrap();
        assert!(out.join("sheet.png").exists());
    }

    #[test]
    fn test_no_overwrite_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 2, 2, Rgba([1, 1, 1, 255]));
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("sheet.json"), "old metadata").unwrap();

        let err = generate(
            &[input.clone()],
            &out,
            "sheet.png",
            1,
            true,
            false,
            &SpritegenConfig::default(),
        )
        .unwrap_err();
        match err {
            GenerateError::OutputWrite { path, source: OutputError::Io(e) } => {
                assert_eq!(path, out.join("sheet.json"));
                assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(dir_entries(&out), vec!["sheet.json"]);

        // Overwrite replaces both
        generate(&[input], &out, "sheet.png", 1, true, true, &SpritegenConfig::default()).unwrap();
        assert_ne!(fs::read_to_string(out.join("sheet.json")).unwrap(), "old metadata");
    }

    #[test]
    fn test_custom_background_and_extension() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![
            write_png(dir.path(), "a.png", 2, 2, Rgba([9, 9, 9, 255])),
            write_png(dir.path(), "b.png", 1, 1, Rgba([9, 9, 9, 255])),
        ];
        let mut config = SpritegenConfig::default();
        config.canvas.background = "#FF00FF".to_string();
        config.metadata.extension = "meta".to_string();

        let report = generate(&inputs, dir.path(), "s.png", 2, true, true, &config).unwrap();
        assert_eq!(report.metadata_path, Some(dir.path().join("s.meta")));

        let sheet = image::open(&report.image_path).unwrap().to_rgba8();
        assert_eq!(*sheet.get_pixel(3, 1), Rgba([255, 0, 255, 255]));
    }

    #[test]
    fn test_oversized_sheet_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 1, 1, Rgba([1, 1, 1, 255]));

        let err = generate(
            &[input],
            dir.path(),
            "sheet.png",
            i64::from(u32::MAX),
            false,
            true,
            &SpritegenConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidConfiguration(_)), "got {}", err);
        assert!(!dir.path().join("sheet.png").exists());
    }

    #[test]
    fn test_failed_sidecar_restores_previous_sheet() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 2, 2, Rgba([1, 1, 1, 255]));
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("sheet.png"), "previous sheet").unwrap();
        // A directory where the sidecar should go makes its commit fail
        fs::create_dir(out.join("sheet.json")).unwrap();

        let err = generate(&[input], &out, "sheet.png", 1, true, true, &SpritegenConfig::default())
            .unwrap_err();
        match err {
            GenerateError::OutputWrite { path, .. } => assert_eq!(path, out.join("sheet.json")),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(fs::read_to_string(out.join("sheet.png")).unwrap(), "previous sheet");
        assert_eq!(dir_entries(&out), vec!["sheet.json", "sheet.png"]);
    }

    #[test]
    fn test_failed_sidecar_removes_new_sheet() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "a.png", 2, 2, Rgba([1, 1, 1, 255]));
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::create_dir(out.join("sheet.json")).unwrap();

        let err = generate(&[input], &out, "sheet.png", 1, true, true, &SpritegenConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenerateError::OutputWrite { .. }));
        assert_eq!(dir_entries(&out), vec!["sheet.json"]);
    }
}
