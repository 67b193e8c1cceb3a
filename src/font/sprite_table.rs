//! Extracts a glyph table from a sprite sheet: one image holding every
//! glyph on a fixed cell grid in row-major order.

use std::ops::Range;
use std::path::Path;

use log::debug;

use crate::error::FontError;
use crate::font::{BitmapFont, Glyph};
use crate::geometry::Rect;
use crate::surface::Surface;

/// Where the sprite sheet pixels come from: a surface already in memory,
/// or an image file on disk.
pub enum SpriteSource<'a> {
    Surface(&'a Surface),
    Path(&'a Path),
}

impl<'a> From<&'a Surface> for SpriteSource<'a> {
    fn from(surface: &'a Surface) -> SpriteSource<'a> {
        SpriteSource::Surface(surface)
    }
}

impl<'a> From<&'a Path> for SpriteSource<'a> {
    fn from(path: &'a Path) -> SpriteSource<'a> {
        SpriteSource::Path(path)
    }
}

/// Builds a font from a sprite sheet.
///
/// `index` assigns codes to grid cells in row-major order; `glyph_size`
/// may be smaller than `cell_size` to leave inter-glyph padding. Every
/// glyph gets `dst = (0, 0, gw, gh)` and the default advance `xwidth`.
/// `mapping` entries are applied on top of the identity mapping for the
/// loaded codes.
pub fn load_sprite_table<'a>(
    source: impl Into<SpriteSource<'a>>,
    index: Range<u16>,
    xwidth: i32,
    glyph_size: (u32, u32),
    cell_size: (u32, u32),
    mapping: &[(u32, u8)],
) -> Result<BitmapFont, FontError> {
    let owned;
    let surface = match source.into() {
        SpriteSource::Surface(surface) => surface,
        SpriteSource::Path(path) => {
            owned = Surface::open(path)?;
            &owned
        }
    };

    if index.end > 256 {
        return Err(FontError::InvalidValue(format!(
            "index range {}..{} does not fit the 0..=255 code space",
            index.start, index.end
        )));
    }
    let (gw, gh) = glyph_size;
    let (cw, ch) = cell_size;
    if cw == 0 || ch == 0 || gw > cw || gh > ch {
        return Err(FontError::InvalidValue(format!(
            "glyph size {}x{} does not fit cell size {}x{}",
            gw, gh, cw, ch
        )));
    }

    let (sheet_w, sheet_h) = surface.size();
    let cols = (sheet_w / cw) as usize;
    let count = index.len();
    let rows = if cols == 0 { 0 } else { (count + cols - 1) / cols };
    if cols == 0 || rows as u32 * ch > sheet_h {
        return Err(FontError::Format(format!(
            "{}x{} surface is not a valid sprite table for {} cells of {}x{}",
            sheet_w, sheet_h, count, cw, ch
        )));
    }

    let mut font = BitmapFont::with_defaults(glyph_size, xwidth);
    for (i, code) in index.enumerate() {
        let col = (i % cols) as i32;
        let row = (i / cols) as i32;
        let src = Rect::from(
            col * cw as i32,
            row * ch as i32,
            col * cw as i32 + gw as i32,
            row * ch as i32 + gh as i32,
        );
        font.insert_glyph(Glyph {
            code: code as u8,
            pixels: surface.crop(&src),
            dst: Rect::from(0, 0, gw as i32, gh as i32),
            advance: xwidth,
        });
    }
    font.apply_mapping(mapping);
    font.recalculate();
    debug!(
        "loaded sprite table: {} glyphs of {}x{}, {} mapping overrides",
        count,
        gw,
        gh,
        mapping.len()
    );
    Ok(font)
}
