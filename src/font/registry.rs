//! A registry of sibling fonts with one active selection. Everything a
//! single glyph table can do is delegated to the selected entry, so a
//! registry can stand wherever "a font" is expected.

use std::ops::Range;

use log::debug;

use crate::error::FontError;
use crate::font::sprite_table::load_sprite_table;
use crate::font::{BitmapFont, Font};
use crate::surface::Surface;

/// Everything needed to build one registry entry: the sheet's metrics
/// descriptor, its raw 1bpp pixel blob, and its Unicode mapping.
#[derive(Debug, Clone)]
pub struct FontSheet {
    pub name: String,
    /// Codes assigned to grid cells, in row-major order.
    pub index: Range<u16>,
    pub xwidth: i32,
    pub glyph_size: (u32, u32),
    pub cell_size: (u32, u32),
    pub table_size: (u32, u32),
    /// Packed row-major 1bpp sprite table pixels.
    pub data: Vec<u8>,
    pub mapping: Vec<(u32, u8)>,
}

/// How a registry entry is addressed: by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSelector {
    Index(usize),
    Name(String),
}

impl From<usize> for FontSelector {
    fn from(index: usize) -> FontSelector {
        FontSelector::Index(index)
    }
}

impl From<&str> for FontSelector {
    fn from(name: &str) -> FontSelector {
        FontSelector::Name(name.to_owned())
    }
}

impl From<String> for FontSelector {
    fn from(name: String) -> FontSelector {
        FontSelector::Name(name)
    }
}

/// Named, indexed glyph tables with a single current selection.
#[derive(Debug)]
pub struct FontRegistry {
    entries: Vec<(String, BitmapFont)>,
    current: usize,
}

impl FontRegistry {
    /// Builds one entry per sheet; the first becomes current. A failed
    /// selector later never leaves `current` dangling, so at least one
    /// sheet is required up front.
    pub fn new(sheets: &[FontSheet]) -> Result<FontRegistry, FontError> {
        if sheets.is_empty() {
            return Err(FontError::InvalidValue(
                "at least one font sheet is required".to_owned(),
            ));
        }
        let mut entries = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            let surface = Surface::from_bytes(sheet.table_size.0, sheet.table_size.1, &sheet.data)?;
            let font = load_sprite_table(
                &surface,
                sheet.index.clone(),
                sheet.xwidth,
                sheet.glyph_size,
                sheet.cell_size,
                &sheet.mapping,
            )?;
            entries.push((sheet.name.clone(), font));
        }
        debug!("registry built with {} fonts", entries.len());
        Ok(FontRegistry {
            entries,
            current: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Switches the current entry. Unknown selectors fail without
    /// changing the selection.
    pub fn select(&mut self, selector: impl Into<FontSelector>) -> Result<(), FontError> {
        match selector.into() {
            FontSelector::Index(index) => {
                if index >= self.entries.len() {
                    return Err(FontError::InvalidValue(format!(
                        "no font with index {}",
                        index
                    )));
                }
                self.current = index;
            }
            FontSelector::Name(name) => {
                match self.entries.iter().position(|(n, _)| *n == name) {
                    Some(index) => self.current = index,
                    None => {
                        return Err(FontError::InvalidValue(format!(
                            "no font with name {}",
                            name
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_name(&self) -> &str {
        &self.entries[self.current].0
    }

    /// The selected glyph table.
    pub fn current(&self) -> &BitmapFont {
        &self.entries[self.current].1
    }

    pub fn current_mut(&mut self) -> &mut BitmapFont {
        &mut self.entries[self.current].1
    }

    /// A non-selected sibling, by position.
    pub fn get(&self, index: usize) -> Option<&BitmapFont> {
        self.entries.get(index).map(|(_, font)| font)
    }

    /// Merges `source` into the currently selected font.
    pub fn combine(
        &mut self,
        source: &BitmapFont,
        characters: Option<&str>,
    ) -> Result<(), FontError> {
        self.current_mut().combine(source, characters)
    }
}

impl Font for FontRegistry {
    fn code_for(&self, codepoint: char) -> Option<u8> {
        self.current().code_for(codepoint)
    }

    fn measure(&self, text: &str, spacing: i32) -> Result<(u32, u32), FontError> {
        self.current().measure(text, spacing)
    }

    fn render(
        &self,
        surface: &mut Surface,
        origin: (i32, i32),
        text: &str,
        spacing: i32,
    ) -> Result<(), FontError> {
        self.current().render(surface, origin, text, spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two 1-glyph sheets with recognizably different pixels.
    fn sheets() -> Vec<FontSheet> {
        let mut left = Surface::new(4, 4);
        left.set(0, 0, true);
        let mut right = Surface::new(4, 4);
        right.set(3, 3, true);
        let sheet = |name: &str, surface: Surface, mapping: Vec<(u32, u8)>| FontSheet {
            name: name.to_owned(),
            index: 0x41..0x42,
            xwidth: 4,
            glyph_size: (4, 4),
            cell_size: (4, 4),
            table_size: (4, 4),
            data: surface.tobytes(),
            mapping,
        };
        vec![
            sheet("A00", left, vec![]),
            sheet("A02", right, vec![(0x25b6, 0x41)]),
        ]
    }

    #[test]
    fn first_entry_starts_selected() {
        let registry = FontRegistry::new(&sheets()).unwrap();
        assert_eq!(registry.current_index(), 0);
        assert_eq!(registry.current_name(), "A00");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn select_by_name_and_index() {
        let mut registry = FontRegistry::new(&sheets()).unwrap();
        registry.select("A02").unwrap();
        assert_eq!(registry.current_index(), 1);
        assert_eq!(registry.code_for('\u{25b6}'), Some(0x41));
        registry.select(0usize).unwrap();
        assert_eq!(registry.current_name(), "A00");
        assert_eq!(registry.code_for('\u{25b6}'), None);
    }

    #[test]
    fn unknown_selectors_fail_without_moving_the_selection() {
        let mut registry = FontRegistry::new(&sheets()).unwrap();
        registry.select(1usize).unwrap();

        let err = registry.select(2usize).unwrap_err();
        assert_eq!(err.to_string(), "no font with index 2");
        let err = registry.select("BAD").unwrap_err();
        assert_eq!(err.to_string(), "no font with name BAD");
        assert_eq!(registry.current_index(), 1);
    }

    #[test]
    fn empty_registry_is_rejected() {
        let err = FontRegistry::new(&[]).unwrap_err();
        assert!(matches!(err, FontError::InvalidValue(_)));
    }

    #[test]
    fn combine_targets_only_the_selected_entry() {
        let mut registry = FontRegistry::new(&sheets()).unwrap();
        let sibling = registry.get(1).unwrap().clone();
        registry.combine(&sibling, Some("\u{25b6}")).unwrap();

        // selected entry gained the character
        let code = registry.code_for('\u{25b6}').unwrap();
        assert!(registry.current().glyph(code).unwrap().pixels.get(3, 3));
        // the sibling is untouched
        assert_eq!(registry.get(1).unwrap().glyph_count(), 1);
        registry.select("A02").unwrap();
        assert_eq!(registry.current().glyph_count(), 1);
    }

    #[test]
    fn measurement_delegates_to_the_selection() {
        let registry = FontRegistry::new(&sheets()).unwrap();
        assert_eq!(registry.measure("A", 0).unwrap(), (4, 4));
        let err = registry.measure("\u{25b6}", 0).unwrap_err();
        assert_eq!(err.to_string(), "no glyph for code point U+25B6");
    }
}
