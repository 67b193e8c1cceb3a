use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, merging or rendering bitmap fonts.
#[derive(Debug, Error)]
pub enum FontError {
    /// The given path does not resolve to anything.
    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),

    /// A resource was located but cannot be used, e.g. a descriptor whose
    /// sibling bitmap data file is gone.
    #[error("{0}")]
    Access(String),

    /// Signature mismatch, wrong pixel mode, or wrong structural shape.
    #[error("{0}")]
    Format(String),

    /// A serialized payload that is structurally present but invalid.
    #[error("{0}")]
    Parse(String),

    /// A code point with no assigned glyph code, hit at measure/render time.
    #[error("no glyph for code point U+{}", codepoint_hex(.0))]
    Mapping(char),

    /// A bad argument value: unknown registry selector, character absent
    /// from a combine source, exhausted code slots.
    #[error("{0}")]
    InvalidValue(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn codepoint_hex(c: &char) -> String {
    format!("{:04X}", *c as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_error_names_the_code_point() {
        assert_eq!(
            FontError::Mapping('\u{25b6}').to_string(),
            "no glyph for code point U+25B6"
        );
        assert_eq!(
            FontError::Mapping('\u{0}').to_string(),
            "no glyph for code point U+0000"
        );
    }
}
