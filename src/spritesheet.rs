//! Spritesheet composition - blits sprites into their grid cells
//!
//! Sprites are copied verbatim (no blending) with their top-left corner on
//! the cell origin. Smaller sprites are never centered or scaled; the rest
//! of the cell keeps the background color.

use image::{imageops, Rgba, RgbaImage};

use crate::layout::GridLayout;

/// Compose sprites into a single sheet.
///
/// `sprites` must be in input order and match the layout they were measured
/// for. The canvas starts filled with `background` so unused cells and the
/// uncovered part of partially filled cells are well defined.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use spritegen::layout::GridLayout;
/// use spritegen::spritesheet::render_spritesheet;
/// use std::num::NonZeroU32;
///
/// let frame = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
/// let frames = vec![frame.clone(), frame.clone(), frame];
/// let layout = GridLayout::compute(&[(2, 2); 3], NonZeroU32::new(2).unwrap()).unwrap();
///
/// let sheet = render_spritesheet(&frames, &layout, Rgba([0, 0, 0, 0]));
/// assert_eq!(sheet.dimensions(), (4, 4));
/// assert_eq!(*sheet.get_pixel(2, 2), Rgba([0, 0, 0, 0])); // empty cell
/// ```
pub fn render_spritesheet<'a>(
    sprites: impl IntoIterator<Item = &'a RgbaImage>,
    layout: &GridLayout,
    background: Rgba<u8>,
) -> RgbaImage {
    let (sheet_width, sheet_height) = layout.sheet_size();
    let mut sheet = RgbaImage::from_pixel(sheet_width, sheet_height, background);

    for (i, sprite) in sprites.into_iter().enumerate().take(layout.len()) {
        let (x, y) = layout.origin_of(i);
        imageops::replace(&mut sheet, sprite, i64::from(x), i64::from(y));
    }

    sheet
}
