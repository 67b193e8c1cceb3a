use std::path::Path;

use bitvec::prelude::*;
use image::{DynamicImage, ImageError};

use crate::error::FontError;
use crate::geometry::Rect;

/// A single-bit pixel surface, row-major with rows padded to a byte
/// boundary. A set bit is ink.
///
/// The padded layout makes `tobytes` a direct view of the backing store
/// and matches the packing used by 1-bit sprite table blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    bits: BitVec<u8, Msb0>,
}

impl Surface {
    /// Bits per row including padding.
    fn stride(width: u32) -> usize {
        ((width as usize + 7) / 8) * 8
    }

    /// Bytes needed to hold a `width` x `height` surface.
    pub fn byte_len(width: u32, height: u32) -> usize {
        Self::stride(width) / 8 * height as usize
    }

    pub fn new(width: u32, height: u32) -> Surface {
        Surface {
            width,
            height,
            bits: bitvec![u8, Msb0; 0; Self::stride(width) * height as usize],
        }
    }

    /// Builds a surface from packed 1bpp bytes, row-major, rows padded to
    /// byte boundaries.
    pub fn from_bytes(width: u32, height: u32, data: &[u8]) -> Result<Surface, FontError> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(FontError::Format(format!(
                "bitmap data is {} bytes; {}x{} needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Surface {
            width,
            height,
            bits: BitVec::from_slice(data),
        })
    }

    /// Decodes an image file into a surface. The file must decode to
    /// 8-bit grayscale carrying only 0/255 samples; anything brighter than
    /// mid-gray is ink.
    pub fn open(path: &Path) -> Result<Surface, FontError> {
        if !path.exists() {
            return Err(FontError::NotFound(path.to_path_buf()));
        }
        let decoded = image::open(path).map_err(|err| match err {
            ImageError::IoError(e) => FontError::Io(e),
            _ => FontError::Format("provided input is not a recognized image".to_owned()),
        })?;
        let gray = match decoded {
            DynamicImage::ImageLuma8(buf) => buf,
            _ => {
                return Err(FontError::Format(format!(
                    "{} is not a valid sprite table",
                    path.display()
                )))
            }
        };
        if gray.pixels().any(|p| p.0[0] != 0 && p.0[0] != 255) {
            return Err(FontError::Format(format!(
                "{} is not a valid sprite table",
                path.display()
            )));
        }
        let (width, height) = gray.dimensions();
        let mut surface = Surface::new(width, height);
        for (x, y, p) in gray.enumerate_pixels() {
            if p.0[0] > 127 {
                surface.set(x as i32, y as i32, true);
            }
        }
        Ok(surface)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        self.bits[y as usize * Self::stride(self.width) + x as usize]
    }

    pub fn set(&mut self, x: i32, y: i32, on: bool) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = y as usize * Self::stride(self.width) + x as usize;
        self.bits.set(idx, on);
    }

    /// Copies the region `rect` into a new surface. Pixels outside this
    /// surface read as blank.
    pub fn crop(&self, rect: &Rect) -> Surface {
        let w = rect.width().max(0) as u32;
        let h = rect.height().max(0) as u32;
        let mut out = Surface::new(w, h);
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                if self.get(rect.x0 + x, rect.y0 + y) {
                    out.set(x, y, true);
                }
            }
        }
        out
    }

    /// Overwrites the region at `(x, y)` with `other`, both ink and blank
    /// pixels. Out-of-range pixels are dropped.
    pub fn paste(&mut self, other: &Surface, x: i32, y: i32) {
        for sy in 0..other.height as i32 {
            for sx in 0..other.width as i32 {
                self.set(x + sx, y + sy, other.get(sx, sy));
            }
        }
    }

    /// ORs the ink pixels of `other` onto this surface at `(x, y)`,
    /// leaving blank source pixels alone.
    pub fn blit_ink(&mut self, other: &Surface, x: i32, y: i32) {
        for sy in 0..other.height as i32 {
            for sx in 0..other.width as i32 {
                if other.get(sx, sy) {
                    self.set(x + sx, y + sy, true);
                }
            }
        }
    }

    /// The raw packed pixel bytes, row-major, one bit per pixel, rows
    /// padded to byte boundaries.
    pub fn tobytes(&self) -> Vec<u8> {
        self.bits.as_raw_slice().to_vec()
    }

    /// Whether no pixel is ink.
    pub fn is_blank(&self) -> bool {
        self.bits.not_any()
    }
}
