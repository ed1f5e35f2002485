//! Wrapper module for [`Glyph`]

use std::fmt::{self, Debug, Formatter};

use crate::style::Style;

/// A leaf occupying exactly one index position
///
/// Glyphs are never merged with their neighbors.
#[derive(Clone)]
pub struct Glyph {
    kind: GlyphKind,
    style: Style,
}

/// The different sorts of [`Glyph`]
#[derive(Clone, Debug, PartialEq)]
pub enum GlyphKind {
    /// The end of a line, carrying the style of the paragraph it terminates
    NewLine { paragraph_style: Style },
    Tabulator,
    /// A marker for the end of some content, like the end of a document
    EndMark,
    /// A placeholder between (or around) the slots of a [`Container`](crate::Container)
    ///
    /// These anchor insertions into the slots, and can't be removed on their own.
    Separator(char),
}

/// The character produced by [`GlyphKind::EndMark`]: U+0003, "END OF TEXT"
pub const ENDMARK_CHAR: char = '\u{3}';

impl Glyph {
    pub fn newline(style: Style, paragraph_style: Style) -> Glyph {
        Glyph {
            kind: GlyphKind::NewLine { paragraph_style },
            style,
        }
    }

    pub fn tab(style: Style) -> Glyph {
        Glyph {
            kind: GlyphKind::Tabulator,
            style,
        }
    }

    pub fn endmark(style: Style) -> Glyph {
        Glyph {
            kind: GlyphKind::EndMark,
            style,
        }
    }

    pub fn separator(c: char, style: Style) -> Glyph {
        Glyph {
            kind: GlyphKind::Separator(c),
            style,
        }
    }

    pub fn kind(&self) -> &GlyphKind {
        &self.kind
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Returns the paragraph style, if this is a newline
    pub fn paragraph_style(&self) -> Option<&Style> {
        match &self.kind {
            GlyphKind::NewLine { paragraph_style } => Some(paragraph_style),
            _ => None,
        }
    }

    pub fn is_newline(&self) -> bool {
        matches!(self.kind, GlyphKind::NewLine { .. })
    }

    pub fn is_separator(&self) -> bool {
        matches!(self.kind, GlyphKind::Separator(_))
    }

    /// Returns the single character that the glyph contributes to the text of a document
    pub fn text(&self) -> char {
        match self.kind {
            GlyphKind::NewLine { .. } => '\n',
            GlyphKind::Tabulator => '\t',
            GlyphKind::EndMark => ENDMARK_CHAR,
            GlyphKind::Separator(c) => c,
        }
    }

    /// Returns a copy with the style replaced
    ///
    /// The paragraph style of a newline is left as-is.
    pub fn with_style(&self, style: Style) -> Glyph {
        Glyph {
            kind: self.kind.clone(),
            style,
        }
    }
}

impl Debug for Glyph {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.kind {
            GlyphKind::NewLine { .. } => f.write_str("NewLine"),
            GlyphKind::Tabulator => f.write_str("Tabulator"),
            GlyphKind::EndMark => f.write_str("EndMark"),
            GlyphKind::Separator(c) => write!(f, "Separator({:?})", c),
        }
    }
}
