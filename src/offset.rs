//! Byte, character, and line:column positions.
//!
//! # Three Ways to Point Into a Document
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Text: "Zoë met\n[@Obama#Person*]"                                   │
//! │                                                                      │
//! │  BYTE INDEX   (what str slicing uses)                                │
//! │    Z  o  [ ë ]  _  m  e  t  \n  [  @  O ...                          │
//! │    0  1  2--3   4  5  6  7  8   9  10 11                             │
//! │                                                                      │
//! │  CHAR INDEX   (what span offsets and chunks use)                     │
//! │    Z  o  ë  _  m  e  t  \n  [  @  O ...                              │
//! │    0  1  2  3  4  5  6  7   8  9  10                                 │
//! │                                                                      │
//! │  LINE:COLUMN  (what the editing shell reports for the cursor)        │
//! │    line 1 = "Zoë met"     columns 0..7                               │
//! │    line 2 = "[@Obama..."  columns 0..                                │
//! │    char 8  ==  2:0                                                   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scanner works on bytes (every delimiter is ASCII, so byte matching is
//! UTF-8 safe) and reports character offsets. The shell speaks line:column.
//! [`TextSpan`] carries both byte and char offsets; [`CursorPosition`]
//! converts between line:column and absolute char offsets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::{Error, Result};

/// A text span with both byte and character offsets.
///
/// Half-open on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    /// Byte offset (start, inclusive)
    pub byte_start: usize,
    /// Byte offset (end, exclusive)
    pub byte_end: usize,
    /// Character offset (start, inclusive)
    pub char_start: usize,
    /// Character offset (end, exclusive)
    pub char_end: usize,
}

impl TextSpan {
    /// Create a span from byte offsets, computing char offsets from text.
    ///
    /// ```
    /// use annotag::offset::TextSpan;
    ///
    /// let text = "Zoë [@x#L*]";
    /// let span = TextSpan::from_bytes(text, 5, text.len());
    /// assert_eq!(span.char_start, 4);
    /// assert_eq!(span.extract(text), "[@x#L*]");
    /// ```
    #[must_use]
    pub fn from_bytes(text: &str, byte_start: usize, byte_end: usize) -> Self {
        SpanConverter::new(text).from_bytes(byte_start, byte_end)
    }

    /// Create a span from character offsets, computing byte offsets from text.
    #[must_use]
    pub fn from_chars(text: &str, char_start: usize, char_end: usize) -> Self {
        SpanConverter::new(text).from_chars(char_start, char_end)
    }

    /// Byte range.
    #[must_use]
    pub const fn byte_range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    /// Character range.
    #[must_use]
    pub const fn char_range(&self) -> Range<usize> {
        self.char_start..self.char_end
    }

    /// Check if this span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.byte_start >= self.byte_end
    }

    /// Whether two spans share at least one character.
    #[must_use]
    pub const fn intersects(&self, other: &TextSpan) -> bool {
        self.char_start < other.char_end && other.char_start < self.char_end
    }

    /// Extract the text for this span.
    #[must_use]
    pub fn extract<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.byte_start..self.byte_end).unwrap_or("")
    }
}

// =============================================================================
// Span Converter
// =============================================================================

/// Pre-computed byte/char tables for one text.
///
/// ASCII text skips the tables entirely.
pub struct SpanConverter {
    byte_to_char: Vec<usize>,
    char_to_byte: Vec<usize>,
    is_ascii: bool,
}

impl SpanConverter {
    /// Create a converter for the given text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self {
                byte_to_char: Vec::new(),
                char_to_byte: Vec::new(),
                is_ascii: true,
            };
        }

        let mut byte_to_char = vec![0usize; text.len() + 1];
        let mut char_to_byte = Vec::with_capacity(text.len() + 1);
        let mut char_count = 0;
        for (char_idx, (byte_idx, ch)) in text.char_indices().enumerate() {
            for slot in &mut byte_to_char[byte_idx..byte_idx + ch.len_utf8()] {
                *slot = char_idx;
            }
            char_to_byte.push(byte_idx);
            char_count = char_idx + 1;
        }
        byte_to_char[text.len()] = char_count;
        char_to_byte.push(text.len());

        Self {
            byte_to_char,
            char_to_byte,
            is_ascii: false,
        }
    }

    /// Convert byte offset to char offset (clamped to the end).
    #[must_use]
    pub fn byte_to_char(&self, byte_idx: usize) -> usize {
        if self.is_ascii {
            byte_idx
        } else {
            self.byte_to_char
                .get(byte_idx)
                .copied()
                .unwrap_or_else(|| self.byte_to_char.last().copied().unwrap_or(0))
        }
    }

    /// Convert char offset to byte offset (clamped to the end).
    #[must_use]
    pub fn char_to_byte(&self, char_idx: usize) -> usize {
        if self.is_ascii {
            char_idx
        } else {
            self.char_to_byte
                .get(char_idx)
                .copied()
                .unwrap_or_else(|| self.char_to_byte.last().copied().unwrap_or(0))
        }
    }

    /// Convert byte span to TextSpan.
    #[must_use]
    pub fn from_bytes(&self, byte_start: usize, byte_end: usize) -> TextSpan {
        TextSpan {
            byte_start,
            byte_end,
            char_start: self.byte_to_char(byte_start),
            char_end: self.byte_to_char(byte_end),
        }
    }

    /// Convert char span to TextSpan.
    #[must_use]
    pub fn from_chars(&self, char_start: usize, char_end: usize) -> TextSpan {
        TextSpan {
            byte_start: self.char_to_byte(char_start),
            byte_end: self.char_to_byte(char_end),
            char_start,
            char_end,
        }
    }
}

// =============================================================================
// Cursor Position
// =============================================================================

/// Cursor location as the editing shell reports it.
///
/// `line` is 1-based, `column` is 0-based and counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Line number (1-based).
    pub line: u32,
    /// Column (0-based, chars).
    pub column: u32,
}

impl CursorPosition {
    /// Start of the document.
    pub const START: CursorPosition = CursorPosition { line: 1, column: 0 };

    /// Create a cursor position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Absolute char offset of this position in `text`.
    ///
    /// Fails if the line does not exist or the column lies past the end of
    /// the line.
    pub fn to_char_offset(self, text: &str) -> Result<usize> {
        let invalid = || Error::InvalidCursor {
            line: self.line,
            column: self.column,
        };
        if self.line == 0 {
            return Err(invalid());
        }

        let mut offset = 0;
        for (idx, line) in text.split('\n').enumerate() {
            if idx + 1 == self.line as usize {
                let width = line.chars().count();
                let column = self.column as usize;
                if column > width {
                    return Err(invalid());
                }
                return Ok(offset + column);
            }
            offset += line.chars().count() + 1;
        }
        Err(invalid())
    }

    /// Position of an absolute char offset in `text` (clamped to the end).
    #[must_use]
    pub fn from_char_offset(text: &str, offset: usize) -> Self {
        let mut line = 1u32;
        let mut column = 0u32;
        for ch in text.chars().take(offset) {
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        Self { line, column }
    }
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for CursorPosition {
    type Err = Error;

    /// Parse `line:column` (also accepts the `line.column` form).
    fn from_str(s: &str) -> Result<Self> {
        let (line, column) = s
            .split_once(':')
            .or_else(|| s.split_once('.'))
            .ok_or_else(|| Error::invalid_command(format!("expected LINE:COLUMN, got {s:?}")))?;
        let line = line
            .trim()
            .parse::<u32>()
            .map_err(|e| Error::invalid_command(format!("bad line in {s:?}: {e}")))?;
        let column = column
            .trim()
            .parse::<u32>()
            .map_err(|e| Error::invalid_command(format!("bad column in {s:?}: {e}")))?;
        if line == 0 {
            return Err(Error::InvalidCursor { line, column });
        }
        Ok(Self { line, column })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_text() {
        let text = "Hello World";
        let span = TextSpan::from_bytes(text, 0, 5);

        assert_eq!(span.char_range(), 0..5);
        assert_eq!(span.extract(text), "Hello");
    }

    #[test]
    fn test_euro_symbol() {
        let text = "Price €50";
        // € = 3 bytes, 1 char
        let span = TextSpan::from_bytes(text, 6, 11);

        assert_eq!(span.char_start, 6);
        assert_eq!(span.char_end, 9);
        assert_eq!(span.extract(text), "€50");
    }

    #[test]
    fn test_cjk_from_chars() {
        let text = "日本語 [@東京#LOC*]";
        let span = TextSpan::from_chars(text, 4, 14);

        assert_eq!(span.byte_start, 10);
        assert_eq!(span.extract(text), "[@東京#LOC*]");
    }

    #[test]
    fn test_converter_unicode() {
        let conv = SpanConverter::new("Price €50");

        assert_eq!(conv.byte_to_char(6), 6);
        assert_eq!(conv.byte_to_char(9), 7);
        assert_eq!(conv.byte_to_char(11), 9);
        assert_eq!(conv.char_to_byte(9), 11);
        assert_eq!(conv.char_to_byte(100), 11);
    }

    #[test]
    fn test_intersects() {
        let a = TextSpan::from_chars("abcdefgh", 0, 4);
        let b = TextSpan::from_chars("abcdefgh", 4, 6);
        let c = TextSpan::from_chars("abcdefgh", 3, 5);

        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(b.intersects(&c));
    }

    #[test]
    fn test_cursor_roundtrip() {
        let text = "first line\nsecond\n\nlast";
        for (pos, offset) in [
            (CursorPosition::new(1, 0), 0),
            (CursorPosition::new(1, 10), 10),
            (CursorPosition::new(2, 3), 14),
            (CursorPosition::new(3, 0), 18),
            (CursorPosition::new(4, 4), 23),
        ] {
            assert_eq!(pos.to_char_offset(text).unwrap(), offset, "{pos}");
            assert_eq!(CursorPosition::from_char_offset(text, offset), pos);
        }
    }

    #[test]
    fn test_cursor_out_of_range() {
        let text = "ab\ncd";
        assert!(CursorPosition::new(1, 3).to_char_offset(text).is_err());
        assert!(CursorPosition::new(3, 0).to_char_offset(text).is_err());
        assert!(CursorPosition::new(0, 0).to_char_offset(text).is_err());
    }

    #[test]
    fn test_cursor_parse() {
        assert_eq!("3:14".parse::<CursorPosition>().unwrap(), CursorPosition::new(3, 14));
        assert_eq!("2.0".parse::<CursorPosition>().unwrap(), CursorPosition::new(2, 0));
        assert!("0:1".parse::<CursorPosition>().is_err());
        assert!("x".parse::<CursorPosition>().is_err());
    }
}
