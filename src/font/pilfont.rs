//! Parser for the legacy PIL font descriptor pair: a `.pil` metrics file
//! next to a `.pbm` bitmap holding the glyph pixels.
//!
//! Descriptor layout: the magic line `PILfont\n`, one `;`-separated info
//! line (seventh field is the nominal glyph height), free-form comment
//! lines, a `DATA\n` marker, then 256 fixed 20-byte records. Each record
//! is ten big-endian i16: advance x/y, dst box, src box. An all-zero
//! record is an unassigned code.

use std::fs;
use std::path::Path;

use binary_reader::{BinaryReader, Endian};
use log::debug;

use crate::error::FontError;
use crate::font::{BitmapFont, Glyph};
use crate::geometry::Rect;
use crate::surface::Surface;

const PIL_MAGIC: &[u8] = b"PILfont\n";
const DATA_MARKER: &[u8] = b"DATA\n";
const RECORD_LEN: usize = 20;
const METRICS_LEN: usize = 256 * RECORD_LEN;

/// Loads a legacy descriptor pair into a glyph table. `mapping` entries
/// are applied on top of the identity mapping, as with sprite tables.
pub fn load_pil_font(path: &Path, mapping: &[(u32, u8)]) -> Result<BitmapFont, FontError> {
    if !path.exists() {
        return Err(FontError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read(path)?;
    if !raw.starts_with(PIL_MAGIC) {
        return Err(FontError::Format(format!(
            "{} is not a recognized font file",
            path.display()
        )));
    }

    // header lines up to the DATA marker; the first carries the glyph height
    let mut pos = PIL_MAGIC.len();
    let mut ysize: i32 = 0;
    let mut first_line = true;
    loop {
        let Some(eol) = raw[pos..].iter().position(|&b| b == b'\n') else {
            return Err(FontError::Format(
                "font file missing metric data".to_owned(),
            ));
        };
        let line = &raw[pos..pos + eol + 1];
        pos += eol + 1;
        if line == DATA_MARKER {
            break;
        }
        if first_line {
            ysize = parse_info_height(line);
            first_line = false;
        }
    }

    let metrics = &raw[pos..];
    if metrics.is_empty() {
        return Err(FontError::Format(
            "font file missing metric data".to_owned(),
        ));
    }
    if metrics.len() < METRICS_LEN {
        return Err(FontError::Format(
            "font file metric data incomplete".to_owned(),
        ));
    }

    let data_path = path.with_extension("pbm");
    if !data_path.exists() {
        return Err(FontError::Access("cannot find glyph data file".to_owned()));
    }
    let sheet = Surface::open(&data_path)?;
    let (sheet_w, sheet_h) = sheet.size();
    let sheet_rect = Rect::from(0, 0, sheet_w as i32, sheet_h as i32);

    let mut font = BitmapFont::with_defaults((0, 0), 0);
    let mut reader = BinaryReader::from_u8(&metrics[..METRICS_LEN]);
    reader.set_endian(Endian::Big);
    let mut max_w = 0;
    let mut max_h = ysize;
    for code in 0..=255u8 {
        let mut record = [0i16; 10];
        for field in record.iter_mut() {
            *field = reader.read_i16()?;
        }
        if record.iter().all(|&v| v == 0) {
            continue;
        }
        let [dx, _dy, d0, d1, d2, d3, s0, s1, s2, s3] = record;
        let dst = Rect::from(d0 as i32, d1 as i32, d2 as i32, d3 as i32);
        let src = Rect::from(s0 as i32, s1 as i32, s2 as i32, s3 as i32);
        if dst.width() < 0 || dst.height() < 0 {
            return Err(FontError::Format(format!(
                "glyph {:#04x} has a negative destination extent",
                code
            )));
        }
        if src.width() < 0 || src.height() < 0 || !sheet_rect.contains(&src) {
            return Err(FontError::Format(format!(
                "glyph {:#04x} bounds fall outside the glyph data file",
                code
            )));
        }
        max_w = max_w.max(dst.width());
        max_h = max_h.max(dst.height());
        font.insert_glyph(Glyph {
            code,
            pixels: sheet.crop(&src),
            dst,
            advance: dx as i32,
        });
    }

    font.glyph_size = (max_w.max(0) as u32, max_h.max(0) as u32);
    font.xwidth = default_advance(&font);
    font.apply_mapping(mapping);
    font.recalculate();
    debug!(
        "loaded descriptor font {}: {} glyphs, cell {}x{}",
        path.display(),
        font.glyph_count(),
        font.glyph_size.0,
        font.glyph_size.1
    );
    Ok(font)
}

/// The info line is `;`-separated with the glyph height in field seven.
fn parse_info_height(line: &[u8]) -> i32 {
    let text = String::from_utf8_lossy(line);
    text.split(';')
        .nth(6)
        .and_then(|field| field.trim().parse().ok())
        .unwrap_or(0)
}

/// The descriptor has no font-wide advance; use the space glyph's, or the
/// widest advance when there is no space.
fn default_advance(font: &BitmapFont) -> i32 {
    if let Some(space) = font.glyph(0x20) {
        return space.advance;
    }
    font.glyphs().map(|g| g.advance).max().unwrap_or(0)
}
