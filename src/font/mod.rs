//! The normalized glyph table and the capability trait shared by
//! everything that can stand in for "a font".

use fxhash::FxHashMap;
use log::debug;

use crate::error::FontError;
use crate::geometry::Rect;
use crate::surface::Surface;

pub mod container;
pub mod pilfont;
pub mod registry;
pub mod sprite_table;

/// Number of addressable glyph code slots per font.
const CODE_SLOTS: usize = 256;

/// Code points in this range address font-local byte codes directly,
/// bypassing the Unicode mapping: U+F8000 is code 0x00, U+F80FF is 0xFF.
const DIRECT_CODE_BASE: u32 = 0xF8000;
const DIRECT_CODE_LAST: u32 = 0xF80FF;

/// Anything that can measure and draw text: a single glyph table or a
/// registry delegating to its selected entry.
pub trait Font {
    /// Resolves a Unicode code point to a font-local glyph code.
    fn code_for(&self, codepoint: char) -> Option<u8>;

    /// Pixel extent of `text`: width is the furthest right edge reached by
    /// the pen walk, height is the union of the glyphs' vertical extents.
    fn measure(&self, text: &str, spacing: i32) -> Result<(u32, u32), FontError>;

    /// Draws `text` onto `surface`. The pen starts at `origin`; each glyph
    /// lands at pen + dst offset, vertical placement is exactly dst.
    fn render(
        &self,
        surface: &mut Surface,
        origin: (i32, i32),
        text: &str,
        spacing: i32,
    ) -> Result<(), FontError>;
}

/// One renderable character cell.
#[derive(Debug, Clone)]
pub struct Glyph {
    /// Font-local byte code, not a Unicode code point.
    pub code: u8,
    /// The glyph's own pixels, copied out of the source surface at load
    /// time so no shared surface needs to outlive the font.
    pub pixels: Surface,
    /// Placement relative to the text origin; independent of the pixel
    /// buffer size so a glyph can sit below the baseline.
    pub dst: Rect,
    /// Horizontal pen movement after drawing.
    pub advance: i32,
}

impl Glyph {
    /// Renders the glyph alone into a `cell`-sized surface at its dst
    /// offset and returns the packed bytes. This is the canonical pattern
    /// the reverse glyph index is keyed on.
    fn cell_bytes(&self, cell: (u32, u32)) -> Vec<u8> {
        let mut canvas = Surface::new(cell.0, cell.1);
        canvas.blit_ink(&self.pixels, self.dst.x0, self.dst.y0);
        canvas.tobytes()
    }
}

/// The normalized font: 256 glyph code slots, a Unicode mapping on top,
/// and aggregate measurements kept in step with the glyphs.
#[derive(Debug, Clone)]
pub struct BitmapFont {
    /// Default cell dimensions.
    pub glyph_size: (u32, u32),
    /// Default advance.
    pub xwidth: i32,
    metrics: Vec<Option<Glyph>>,
    mapping: FxHashMap<u32, u8>,
    ascent: i32,
    descent: i32,
    max_width: i32,
    glyph_index: Option<FxHashMap<Vec<u8>, u8>>,
}

impl BitmapFont {
    pub(crate) fn with_defaults(glyph_size: (u32, u32), xwidth: i32) -> BitmapFont {
        BitmapFont {
            glyph_size,
            xwidth,
            metrics: (0..CODE_SLOTS).map(|_| None).collect(),
            mapping: FxHashMap::default(),
            ascent: 0,
            descent: 0,
            max_width: 0,
            glyph_index: None,
        }
    }

    pub fn glyph(&self, code: u8) -> Option<&Glyph> {
        self.metrics[code as usize].as_ref()
    }

    /// Present glyphs in ascending code order.
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.metrics.iter().flatten()
    }

    pub fn glyph_count(&self) -> usize {
        self.metrics.iter().filter(|m| m.is_some()).count()
    }

    pub fn mapping(&self) -> &FxHashMap<u32, u8> {
        &self.mapping
    }

    /// Pixels above the text origin across all glyphs.
    pub fn ascent(&self) -> i32 {
        self.ascent
    }

    /// Pixels below the text origin across all glyphs.
    pub fn descent(&self) -> i32 {
        self.descent
    }

    pub fn max_width(&self) -> i32 {
        self.max_width
    }

    /// Full vertical extent of the font.
    pub fn height(&self) -> i32 {
        self.ascent + self.descent
    }

    pub(crate) fn insert_glyph(&mut self, glyph: Glyph) {
        let slot = glyph.code as usize;
        self.metrics[slot] = Some(glyph);
        self.glyph_index = None;
    }

    /// Replaces a glyph's placement rectangle and refreshes the aggregates.
    pub fn set_glyph_dst(&mut self, code: u8, dst: Rect) -> Result<(), FontError> {
        if dst.width() < 0 || dst.height() < 0 {
            return Err(FontError::InvalidValue(format!(
                "destination rectangle for code {:#04x} has negative extent",
                code
            )));
        }
        match self.metrics[code as usize].as_mut() {
            Some(glyph) => glyph.dst = dst,
            None => {
                return Err(FontError::InvalidValue(format!(
                    "no glyph assigned to code {:#04x}",
                    code
                )))
            }
        }
        self.recalculate();
        self.glyph_index = None;
        Ok(())
    }

    /// Materializes identity mapping entries for every present code, then
    /// lays `overrides` on top. Overrides naming an unassigned code are
    /// dropped with a warning so every mapped code point stays renderable.
    pub(crate) fn apply_mapping(&mut self, overrides: &[(u32, u8)]) {
        for code in 0..CODE_SLOTS {
            if self.metrics[code].is_some() {
                self.mapping.insert(code as u32, code as u8);
            }
        }
        for &(codepoint, code) in overrides {
            if self.metrics[code as usize].is_some() {
                self.mapping.insert(codepoint, code);
            } else {
                log::warn!(
                    "mapping override U+{:04X} -> {:#04x} dropped: no glyph at that code",
                    codepoint,
                    code
                );
            }
        }
    }

    /// Recomputes ascent/descent/max_width from the present glyphs' dst
    /// extents. Called after every metrics mutation.
    pub(crate) fn recalculate(&mut self) {
        let mut top = i32::MAX;
        let mut bottom = i32::MIN;
        let mut right = 0;
        let mut any = false;
        for glyph in self.metrics.iter().flatten() {
            top = top.min(glyph.dst.y0);
            bottom = bottom.max(glyph.dst.y1);
            right = right.max(glyph.dst.x1);
            any = true;
        }
        if any {
            self.ascent = -top;
            self.descent = bottom;
            self.max_width = right;
        } else {
            self.ascent = 0;
            self.descent = 0;
            self.max_width = 0;
        }
    }

    fn resolve(&self, codepoint: char) -> Option<u8> {
        let cp = codepoint as u32;
        if let Some(&code) = self.mapping.get(&cp) {
            return Some(code);
        }
        if (DIRECT_CODE_BASE..=DIRECT_CODE_LAST).contains(&cp) {
            let code = (cp - DIRECT_CODE_BASE) as u8;
            if self.metrics[code as usize].is_some() {
                return Some(code);
            }
        }
        None
    }

    fn walk<F>(&self, text: &str, spacing: i32, mut visit: F) -> Result<(), FontError>
    where
        F: FnMut(i32, &Glyph),
    {
        let mut pen = 0;
        let mut first = true;
        for ch in text.chars() {
            let code = self.resolve(ch).ok_or(FontError::Mapping(ch))?;
            let glyph = self.glyph(code).ok_or(FontError::Mapping(ch))?;
            if !first {
                pen += spacing;
            }
            visit(pen, glyph);
            pen += glyph.advance;
            first = false;
        }
        Ok(())
    }

    /// A fresh code slot for a merged glyph, never on top of an existing
    /// one. Prefers the slot above the highest assigned code; when that
    /// range is used up, reuses the lowest gap instead.
    fn next_free_code(&self) -> Result<u8, FontError> {
        let next = match self.metrics.iter().rposition(|m| m.is_some()) {
            Some(highest) => highest + 1,
            None => 0,
        };
        if next < CODE_SLOTS {
            return Ok(next as u8);
        }
        match self.metrics.iter().position(|m| m.is_none()) {
            Some(gap) => Ok(gap as u8),
            None => Err(FontError::InvalidValue(
                "no free code slot in target font".to_owned(),
            )),
        }
    }

    /// Merges glyphs from `source` into this font.
    ///
    /// With `characters: None`, every code point the source maps and this
    /// font does not gains an entry; each backing glyph is copied into a
    /// freshly allocated slot, shared between code points that shared one
    /// in the source. Code points already mapped here keep their glyph.
    ///
    /// With `characters: Some(..)`, each character is resolved in the
    /// source font (an unresolvable one aborts the rest of the batch but
    /// keeps what was already merged) and mapped here last-write-wins, so
    /// a code point known to both fonts renders the source glyph afterward.
    pub fn combine(
        &mut self,
        source: &BitmapFont,
        characters: Option<&str>,
    ) -> Result<(), FontError> {
        let result = self.combine_inner(source, characters);
        self.recalculate();
        self.glyph_index = None;
        result
    }

    fn combine_inner(
        &mut self,
        source: &BitmapFont,
        characters: Option<&str>,
    ) -> Result<(), FontError> {
        match characters {
            None => {
                let mut relocated: FxHashMap<u8, u8> = FxHashMap::default();
                for (&codepoint, &source_code) in &source.mapping {
                    if self.mapping.contains_key(&codepoint) {
                        continue;
                    }
                    let Some(glyph) = source.metrics[source_code as usize].as_ref() else {
                        continue;
                    };
                    let new_code = match relocated.get(&source_code) {
                        Some(&code) => code,
                        None => {
                            let code = self.next_free_code()?;
                            let mut glyph = glyph.clone();
                            glyph.code = code;
                            self.insert_glyph(glyph);
                            relocated.insert(source_code, code);
                            code
                        }
                    };
                    self.mapping.insert(codepoint, new_code);
                }
                debug!("merged {} glyphs from source font", relocated.len());
            }
            Some(characters) => {
                for ch in characters.chars() {
                    let source_code = source.resolve(ch).ok_or_else(|| {
                        FontError::InvalidValue(format!(
                            "{} is not a valid character within the source font",
                            ch
                        ))
                    })?;
                    let glyph = source.glyph(source_code).ok_or_else(|| {
                        FontError::InvalidValue(format!(
                            "{} is not a valid character within the source font",
                            ch
                        ))
                    })?;
                    let new_code = self.next_free_code()?;
                    let mut glyph = glyph.clone();
                    glyph.code = new_code;
                    self.insert_glyph(glyph);
                    self.mapping.insert(ch as u32, new_code);
                }
            }
        }
        Ok(())
    }

    /// The reverse index from a glyph's canonical cell bytes to its code,
    /// built on first use and thrown away whenever the metrics change.
    pub fn glyph_index(&mut self) -> &FxHashMap<Vec<u8>, u8> {
        let metrics = &self.metrics;
        let cell = self.glyph_size;
        self.glyph_index.get_or_insert_with(|| {
            let mut index = FxHashMap::default();
            for glyph in metrics.iter().flatten() {
                index.insert(glyph.cell_bytes(cell), glyph.code);
            }
            index
        })
    }

    /// Which code renders exactly `pattern` (packed cell bytes), if any.
    pub fn identify(&mut self, pattern: &[u8]) -> Option<u8> {
        self.glyph_index().get(pattern).copied()
    }
}

impl Font for BitmapFont {
    fn code_for(&self, codepoint: char) -> Option<u8> {
        self.resolve(codepoint)
    }

    fn measure(&self, text: &str, spacing: i32) -> Result<(u32, u32), FontError> {
        let mut right = 0;
        let mut top = i32::MAX;
        let mut bottom = i32::MIN;
        let mut any = false;
        self.walk(text, spacing, |pen, glyph| {
            right = right.max(pen + glyph.dst.x1);
            top = top.min(glyph.dst.y0);
            bottom = bottom.max(glyph.dst.y1);
            any = true;
        })?;
        if !any {
            return Ok((0, 0));
        }
        Ok((right.max(0) as u32, (bottom - top).max(0) as u32))
    }

    fn render(
        &self,
        surface: &mut Surface,
        origin: (i32, i32),
        text: &str,
        spacing: i32,
    ) -> Result<(), FontError> {
        self.walk(text, spacing, |pen, glyph| {
            surface.blit_ink(&glyph.pixels, origin.0 + pen + glyph.dst.x0, origin.1 + glyph.dst.y0);
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a glyph from rows of '.'/'X' art; dst matches the pixel size.
    pub fn glyph_from_art(code: u8, advance: i32, art: &[&str]) -> Glyph {
        let h = art.len() as u32;
        let w = art.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut pixels = Surface::new(w, h);
        for (y, row) in art.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == 'X' {
                    pixels.set(x as i32, y as i32, true);
                }
            }
        }
        Glyph {
            code,
            pixels,
            dst: Rect::from(0, 0, w as i32, h as i32),
            advance,
        }
    }

    /// A 4x4 test font with four distinct glyphs at codes 0x41..=0x44 and
    /// one mapping override (U+25B6 -> 0x44).
    pub fn small_font() -> BitmapFont {
        let mut font = BitmapFont::with_defaults((4, 4), 4);
        font.insert_glyph(glyph_from_art(0x41, 4, &["X...", "X...", "X...", "X..."]));
        font.insert_glyph(glyph_from_art(0x42, 4, &[".X..", ".X..", ".X..", ".X.."]));
        font.insert_glyph(glyph_from_art(0x43, 4, &["XX..", "..X.", "XX..", "..X."]));
        font.insert_glyph(glyph_from_art(0x44, 4, &["XXXX", "X..X", "X..X", "XXXX"]));
        font.apply_mapping(&[(0x25b6, 0x44)]);
        font.recalculate();
        font
    }
}
