//! Wrapper module for [`Text`]

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::style::Style;

/// A run of plain characters, all with the same style
///
/// Indexing is by character, not byte. The content is shared between all copies; only splitting
/// and merging produce new strings.
#[derive(Clone)]
pub struct Text {
    content: Arc<str>,
    // The number of characters in `content`
    len: usize,
    style: Style,
}

impl Text {
    /// Creates a new run from the characters and style
    pub fn new(content: &str, style: Style) -> Text {
        Text {
            content: Arc::from(content),
            len: content.chars().count(),
            style,
        }
    }

    /// Returns the content of the run
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the number of characters in the run
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Returns a copy with the style replaced
    pub fn with_style(&self, style: Style) -> Text {
        Text {
            content: self.content.clone(),
            len: self.len,
            style,
        }
    }

    /// Returns the characters in `i1..i2` as a string slice
    ///
    /// ## Panics
    ///
    /// Panics if `i1 > i2` or `i2 > self.len()`.
    pub fn str_slice(&self, i1: usize, i2: usize) -> &str {
        assert!(i1 <= i2 && i2 <= self.len, "invalid slice {}..{}", i1, i2);
        let start = self.byte_idx(i1);
        let end = start + byte_idx(&self.content[start..], i2 - i1);
        &self.content[start..end]
    }

    /// Returns a new run containing only `i1..i2`, with the same style
    pub fn slice(&self, i1: usize, i2: usize) -> Text {
        if i1 == 0 && i2 == self.len {
            return self.clone();
        }

        Text {
            content: Arc::from(self.str_slice(i1, i2)),
            len: i2 - i1,
            style: self.style.clone(),
        }
    }

    /// Returns the run with `i1..i2` removed
    pub fn without(&self, i1: usize, i2: usize) -> Text {
        let start = self.byte_idx(i1);
        let end = self.byte_idx(i2);

        let mut s = String::with_capacity(self.content.len() - (end - start));
        s.push_str(&self.content[..start]);
        s.push_str(&self.content[end..]);

        Text {
            content: Arc::from(s),
            len: self.len - (i2 - i1),
            style: self.style.clone(),
        }
    }

    /// Returns whether `other` can be appended onto this run, keeping it at most `max_run` long
    ///
    /// Styles are compared by identity.
    pub fn can_merge(&self, other: &Text, max_run: usize) -> bool {
        Style::same(&self.style, &other.style) && self.len + other.len <= max_run
    }

    /// Appends `other` onto the end of this run, keeping this run's style
    pub fn merge(&self, other: &Text) -> Text {
        let mut s = String::with_capacity(self.content.len() + other.content.len());
        s.push_str(&self.content);
        s.push_str(&other.content);

        Text {
            content: Arc::from(s),
            len: self.len + other.len,
            style: self.style.clone(),
        }
    }

    // Returns the byte index of the `i`th character
    fn byte_idx(&self, i: usize) -> usize {
        byte_idx(&self.content, i)
    }
}

// Returns the byte index of the `i`th character of `s`, or the length of `s` if `i` is past the end
fn byte_idx(s: &str, i: usize) -> usize {
    s.char_indices().nth(i).map(|(b, _)| b).unwrap_or_else(|| s.len())
}

impl Debug for Text {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Text({:?})", &*self.content)
    }
}
