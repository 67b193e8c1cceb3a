//! Raster font loading, merging and rendering for fixed-cell displays.
//!
//! Character LCD/OLED controllers ship fixed glyph ROMs; this crate turns
//! the usual source material for such glyph sets, a grid-arranged sprite
//! sheet or a legacy PIL descriptor pair, into a normalized, queryable
//! [`BitmapFont`]. A font measures and renders text, absorbs glyphs from a
//! sibling font via [`BitmapFont::combine`], persists to a standalone
//! binary container, and can live in a [`FontRegistry`] next to alternate
//! character sets.
//!
//! ```no_run
//! use std::path::Path;
//! use bitfont::{load_sprite_table, Font, Surface};
//!
//! # fn main() -> Result<(), bitfont::FontError> {
//! let font = load_sprite_table(
//!     Path::new("hd44780a02.pbm"),
//!     16..256,
//!     5,
//!     (5, 8),
//!     (5, 8),
//!     &[(0x25b6, 0x10)],
//! )?;
//! let (w, h) = font.measure("0.5\u{25b6}", 0)?;
//! let mut canvas = Surface::new(w, h);
//! font.render(&mut canvas, (0, 0), "0.5\u{25b6}", 0)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod font;
pub mod geometry;
pub mod surface;

pub use error::FontError;
pub use font::container::{load, loads, save, CONTAINER_MAGIC};
pub use font::pilfont::load_pil_font;
pub use font::registry::{FontRegistry, FontSelector, FontSheet};
pub use font::sprite_table::{load_sprite_table, SpriteSource};
pub use font::{BitmapFont, Font, Glyph};
pub use geometry::Rect;
pub use surface::Surface;
