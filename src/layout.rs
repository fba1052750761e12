//! Grid layout - uniform-cell, row-major placement of sprites
//!
//! Every cell is sized to the largest sprite in each dimension. Sprite `i`
//! lands in column `i % columns` and row `i / columns`, so input order is
//! the reading order of the sheet.

use serde::Serialize;
use std::num::NonZeroU32;

/// Largest sheet buffer, in bytes of RGBA8, that a layout may describe.
///
/// Matches the image crate's default decoding allocation limit (512 MiB).
pub const MAX_SHEET_BYTES: u64 = 512 * 1024 * 1024;

/// A placed rectangle within the sheet, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Grid geometry derived from the column count and the sprite sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    columns: u32,
    rows: u32,
    count: u32,
    cell_width: u32,
    cell_height: u32,
}

impl GridLayout {
    /// Compute the layout for sprites of the given `(width, height)` sizes.
    ///
    /// Returns `None` when `sizes` is empty, when a sheet dimension would
    /// overflow `u32`, or when the RGBA sheet would exceed [`MAX_SHEET_BYTES`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU32;
    /// use spritegen::layout::GridLayout;
    ///
    /// let cols = NonZeroU32::new(2).unwrap();
    /// let layout = GridLayout::compute(&[(10, 10), (20, 15), (5, 5)], cols).unwrap();
    /// assert_eq!(layout.cell_size(), (20, 15));
    /// assert_eq!(layout.rows(), 2);
    /// assert_eq!(layout.sheet_size(), (40, 30));
    /// ```
    pub fn compute(sizes: &[(u32, u32)], columns: NonZeroU32) -> Option<Self> {
        if sizes.is_empty() {
            return None;
        }

        let count = u32::try_from(sizes.len()).ok()?;
        let cell_width = sizes.iter().map(|s| s.0).max().unwrap_or(0);
        let cell_height = sizes.iter().map(|s| s.1).max().unwrap_or(0);

        let columns = columns.get();
        let rows = count.div_ceil(columns);

        let sheet_width = cell_width.checked_mul(columns)?;
        let sheet_height = cell_height.checked_mul(rows)?;
        let sheet_bytes =
            u64::from(sheet_width).checked_mul(u64::from(sheet_height))?.checked_mul(4)?;
        if sheet_bytes > MAX_SHEET_BYTES {
            return None;
        }

        Some(Self { columns, rows, count, cell_width, cell_height })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of sprites placed
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Cell dimensions (width, height)
    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    /// Full sheet dimensions (width, height)
    pub fn sheet_size(&self) -> (u32, u32) {
        (self.cell_width * self.columns, self.cell_height * self.rows)
    }

    /// Grid cell `(col, row)` for the sprite at `index`.
    pub fn cell_of(&self, index: usize) -> (u32, u32) {
        let i = index as u32;
        (i % self.columns, i / self.columns)
    }

    /// Top-left pixel of the cell holding the sprite at `index`.
    pub fn origin_of(&self, index: usize) -> (u32, u32) {
        let (col, row) = self.cell_of(index);
        (col * self.cell_width, row * self.cell_height)
    }

    /// Placement of a `width` x `height` sprite at `index`, anchored top-left.
    pub fn place(&self, index: usize, width: u32, height: u32) -> Rect {
        let (x, y) = self.origin_of(index);
        Rect { x, y, w: width, h: height }
    }
}
