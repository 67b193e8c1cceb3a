use serde::{Deserialize, Serialize};

/// An integer rectangle spanning `x0..x1` by `y0..y1`.
///
/// Glyphs carry two of these: `src` locates pixels inside a sprite surface
/// and `dst` places them relative to the text origin. The two are
/// independent, which is what lets a glyph be narrower than its cell or
/// sit below the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub const fn from(x0: i32, y0: i32, x1: i32, y1: i32) -> Rect {
        Rect { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::from(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}
