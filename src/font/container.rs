//! The self-describing binary container for glyph tables.
//!
//! The payload is a CBOR record carrying the default advance, the glyph
//! size, every glyph with its own packed pixel bytes, and the full
//! Unicode mapping as an explicit pair list. Nothing references a shared
//! sprite surface, so a reloaded font is standalone. On disk the payload
//! is framed by a signature that tells this format apart from the legacy
//! descriptor format.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::FontError;
use crate::font::{BitmapFont, Glyph};
use crate::geometry::Rect;
use crate::surface::Surface;

/// Leading signature of a container file.
pub const CONTAINER_MAGIC: &[u8; 8] = b"BITFONT\x01";

const INVALID: &str = "cannot parse font data; it is invalid";

#[derive(Serialize, Deserialize)]
struct FontRecord {
    xwidth: i32,
    glyph_size: (u32, u32),
    metrics: Vec<GlyphRecord>,
    mapping: Vec<(u32, u8)>,
}

#[derive(Serialize, Deserialize)]
struct GlyphRecord {
    code: u8,
    dst: Rect,
    advance: i32,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Serializes a font to the bare container payload.
pub fn dumps(font: &BitmapFont) -> Result<Vec<u8>, FontError> {
    let record = FontRecord {
        xwidth: font.xwidth,
        glyph_size: font.glyph_size,
        metrics: font
            .glyphs()
            .map(|glyph| {
                let (width, height) = glyph.pixels.size();
                GlyphRecord {
                    code: glyph.code,
                    dst: glyph.dst,
                    advance: glyph.advance,
                    width,
                    height,
                    data: glyph.pixels.tobytes(),
                }
            })
            .collect(),
        mapping: {
            let mut pairs: Vec<(u32, u8)> =
                font.mapping().iter().map(|(&cp, &code)| (cp, code)).collect();
            pairs.sort_unstable();
            pairs
        },
    };
    let mut out = Vec::new();
    ciborium::into_writer(&record, &mut out)
        .map_err(|_| FontError::Parse("cannot encode font data".to_owned()))?;
    Ok(out)
}

/// Rebuilds a font from a bare container payload.
pub fn loads(data: &[u8]) -> Result<BitmapFont, FontError> {
    let record: FontRecord =
        ciborium::from_reader(data).map_err(|_| FontError::Parse(INVALID.to_owned()))?;
    if record.metrics.is_empty() {
        return Err(FontError::Parse(INVALID.to_owned()));
    }

    let mut font = BitmapFont::with_defaults(record.glyph_size, record.xwidth);
    for entry in record.metrics {
        let pixels = Surface::from_bytes(entry.width, entry.height, &entry.data)
            .map_err(|_| FontError::Parse(INVALID.to_owned()))?;
        if entry.dst.width() < 0 || entry.dst.height() < 0 {
            return Err(FontError::Parse(INVALID.to_owned()));
        }
        font.insert_glyph(Glyph {
            code: entry.code,
            pixels,
            dst: entry.dst,
            advance: entry.advance,
        });
    }
    // the serialized mapping is authoritative; identity is not re-derived
    for (codepoint, code) in record.mapping {
        if font.glyph(code).is_some() {
            font.mapping.insert(codepoint, code);
        } else {
            log::warn!(
                "container mapping U+{:04X} -> {:#04x} dropped: no such glyph",
                codepoint,
                code
            );
        }
    }
    font.recalculate();
    debug!("restored container font: {} glyphs", font.glyph_count());
    Ok(font)
}

/// Writes the signed container file.
pub fn save(font: &BitmapFont, path: &Path) -> Result<(), FontError> {
    let payload = dumps(font)?;
    let mut file = fs::File::create(path)?;
    file.write_all(CONTAINER_MAGIC)?;
    file.write_all(&payload)?;
    Ok(())
}

/// Reads a signed container file.
pub fn load(path: &Path) -> Result<BitmapFont, FontError> {
    if !path.exists() {
        return Err(FontError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read(path)?;
    if !raw.starts_with(CONTAINER_MAGIC) {
        return Err(FontError::Format(format!(
            "{} is not a recognized font container file",
            path.display()
        )));
    }
    loads(&raw[CONTAINER_MAGIC.len()..])
}

impl BitmapFont {
    /// Serializes this font to the bare container payload.
    pub fn dumps(&self) -> Result<Vec<u8>, FontError> {
        dumps(self)
    }

    /// Writes this font as a signed container file.
    pub fn save(&self, path: &Path) -> Result<(), FontError> {
        save(self, path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::font::test_support::small_font;
    use crate::font::Font;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bitfont-container-{}-{}", std::process::id(), name))
    }

    fn render_all(font: &BitmapFont, text: &str) -> Surface {
        let (w, h) = font.measure(text, 0).unwrap();
        let mut img = Surface::new(w, h);
        font.render(&mut img, (0, 0), text, 0).unwrap();
        img
    }

    #[test]
    fn dumps_loads_round_trip_is_pixel_exact() {
        let font = small_font();
        let restored = loads(&font.dumps().unwrap()).unwrap();

        assert_eq!(restored.glyph_count(), font.glyph_count());
        assert_eq!(restored.glyph_size, font.glyph_size);
        assert_eq!(restored.xwidth, font.xwidth);
        for text in ["ABCD", "\u{25b6}", "DCBA"] {
            assert_eq!(render_all(&restored, text), render_all(&font, text));
        }
    }

    #[test]
    fn mapping_survives_reload_without_identity_assumptions() {
        let font = small_font();
        let restored = loads(&font.dumps().unwrap()).unwrap();
        assert_eq!(restored.mapping(), font.mapping());
    }

    #[test]
    fn round_trip_after_combine_and_dst_mutation() {
        let mut font = small_font();
        let mut source = small_font();
        source
            .set_glyph_dst(0x44, Rect::from(0, 2, 4, 6))
            .unwrap();
        font.combine(&source, Some("\u{25b6}")).unwrap();

        let restored = loads(&font.dumps().unwrap()).unwrap();
        assert_eq!(restored.measure("\u{25b6}", 0).unwrap(), (4, 4));
        assert_eq!(restored.descent(), 6);
        assert_eq!(
            render_all(&restored, "A\u{25b6}"),
            render_all(&font, "A\u{25b6}")
        );
    }

    #[test]
    fn missing_required_fields_fail_to_parse() {
        // structurally valid CBOR, but not a font record
        #[derive(Serialize)]
        struct Partial {
            xwidth: i32,
            glyph_size: (u32, u32),
        }
        let mut bytes = Vec::new();
        ciborium::into_writer(&Partial { xwidth: 5, glyph_size: (5, 8) }, &mut bytes).unwrap();
        let err = loads(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "cannot parse font data; it is invalid");
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = loads(b"PILfont\nDATA\n").unwrap_err();
        assert_eq!(err.to_string(), "cannot parse font data; it is invalid");
    }

    #[test]
    fn empty_metrics_fail_to_parse() {
        let empty = FontRecord {
            xwidth: 5,
            glyph_size: (5, 8),
            metrics: Vec::new(),
            mapping: Vec::new(),
        };
        let mut bytes = Vec::new();
        ciborium::into_writer(&empty, &mut bytes).unwrap();
        let err = loads(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "cannot parse font data; it is invalid");
    }

    #[test]
    fn save_and_load_keep_the_signature() {
        let font = small_font();
        let path = temp_path("font.bmf");
        font.save(&path).unwrap();
        let restored = load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(render_all(&restored, "ABCD"), render_all(&font, "ABCD"));
    }

    #[test]
    fn unsigned_file_is_not_a_container() {
        let path = temp_path("plain.bmf");
        fs::write(&path, b"PILfont\nnot a container").unwrap();
        let err = load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(err
            .to_string()
            .ends_with("is not a recognized font container file"));
    }

    #[test]
    fn missing_container_path_is_not_found() {
        let err = load(&temp_path("absent.bmf")).unwrap_err();
        assert!(matches!(err, FontError::NotFound(_)));
    }
}
