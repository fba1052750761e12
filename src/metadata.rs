//! Sheet metadata - per-sprite placement records and their JSON sidecar
//!
//! # Output Format
//!
//! ```json
//! {
//!   "image": "SpriteSheet.png",
//!   "size": [40, 30],
//!   "cell": [20, 15],
//!   "columns": 2,
//!   "rows": 2,
//!   "sprites": [
//!     { "index": 0, "name": "a.png", "path": "art/a.png", "x": 0, "y": 0, "w": 10, "h": 10 }
//!   ]
//! }
//! ```
//!
//! Sprites are listed in input order. The document never carries timestamps,
//! so regenerating the same sheet yields the same bytes.

use serde::Serialize;
use std::path::Path;

use crate::decode::SourceImage;
use crate::layout::{GridLayout, Rect};

/// A sprite's position and size within the sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteMetadataEntry {
    /// Position in the input list
    pub index: usize,
    /// File name of the source image
    pub name: String,
    /// Source path as given
    pub path: String,
    #[serde(flatten)]
    pub rect: Rect,
}

/// Complete sidecar document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetMetadata {
    /// File name of the sheet image
    pub image: String,
    pub size: [u32; 2],
    pub cell: [u32; 2],
    pub columns: u32,
    pub rows: u32,
    pub sprites: Vec<SpriteMetadataEntry>,
}

impl SheetMetadata {
    /// Build metadata for `sources` placed by `layout`.
    pub fn new(image_name: &str, layout: &GridLayout, sources: &[SourceImage]) -> Self {
        let (sheet_w, sheet_h) = layout.sheet_size();
        let (cell_w, cell_h) = layout.cell_size();

        let sprites = sources
            .iter()
            .enumerate()
            .map(|(index, source)| SpriteMetadataEntry {
                index,
                name: source.name(),
                path: source.path.display().to_string(),
                rect: layout.place(index, source.width(), source.height()),
            })
            .collect();

        Self {
            image: image_name.to_string(),
            size: [sheet_w, sheet_h],
            cell: [cell_w, cell_h],
            columns: layout.columns(),
            rows: layout.rows(),
            sprites,
        }
    }

    /// Serialize to JSON. Pretty output ends with a newline.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            let mut json = serde_json::to_string_pretty(self)?;
            json.push('\n');
            Ok(json)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Sidecar file name for a sheet: same stem, metadata extension.
///
/// ```
/// use std::path::Path;
/// use spritegen::metadata::sidecar_name;
///
/// assert_eq!(sidecar_name(Path::new("SpriteSheet.png"), "json"), "SpriteSheet.json");
/// assert_eq!(sidecar_name(Path::new("sheet"), "json"), "sheet.json");
/// ```
pub fn sidecar_name(image_file: &Path, extension: &str) -> String {
    let stem = image_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spritesheet".to_string());
    format!("{}.{}", stem, extension.trim_start_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::num::NonZeroU32;
    use std::path::PathBuf;

    fn source(path: &str, w: u32, h: u32) -> SourceImage {
        SourceImage {
            path: PathBuf::from(path),
            image: RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255])),
            format: None,
        }
    }

    fn example() -> SheetMetadata {
        let sources = vec![
            source("art/a.png", 10, 10),
            source("art/b.png", 20, 15),
            source("art/c.png", 5, 5),
        ];
        let sizes: Vec<_> = sources.iter().map(|s| (s.width(), s.height())).collect();
        let layout = GridLayout::compute(&sizes, NonZeroU32::new(2).unwrap()).unwrap();
        SheetMetadata::new("sheet.png", &layout, &sources)
    }

    #[test]
    fn test_entries_in_input_order() {
        let metadata = example();

        assert_eq!(metadata.size, [40, 30]);
        assert_eq!(metadata.cell, [20, 15]);
        assert_eq!((metadata.columns, metadata.rows), (2, 2));

        let rects: Vec<_> = metadata.sprites.iter().map(|s| s.rect).collect();
        assert_eq!(
            rects,
            vec![
                Rect { x: 0, y: 0, w: 10, h: 10 },
                Rect { x: 20, y: 0, w: 20, h: 15 },
                Rect { x: 0, y: 15, w: 5, h: 5 },
            ]
        );
        let names: Vec<_> = metadata.sprites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_json_shape() {
        let json = example().to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["image"], "sheet.png");
        assert_eq!(value["size"], serde_json::json!([40, 30]));
        let second = &value["sprites"][1];
        assert_eq!(second["index"], 1);
        assert_eq!(second["x"], 20);
        assert_eq!(second["y"], 0);
        assert_eq!(second["w"], 20);
        assert_eq!(second["h"], 15);
        // Rect fields are flattened into the entry
        assert!(second.get("rect").is_none());
    }

    #[test]
    fn test_json_is_deterministic() {
        let a = example().to_json(true).unwrap();
        let b = example().to_json(true).unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with('\n'));
    }

    #[test]
    fn test_sidecar_name_strips_leading_dot() {
        assert_eq!(sidecar_name(Path::new("out.png"), ".meta"), "out.meta");
    }
}
