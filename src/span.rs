//! The bracketed span format.
//!
//! ```text
//!   gold:       [@Barack Obama#Person*]
//!   suggested:  [$Barack Obama#Person*]
//!               └┬┘└────┬─────┘└──┬──┘└┬┘
//!              open    text    #label close
//! ```
//!
//! The label runs from the last `#` to the first `*]`. A `*]` directly
//! followed by `#` is malformed unless it closes a nested span.
//! A gold span may start with one complete gold span of its own:
//! `[@[@Obama#Person*] administration#Organization*]`. Deeper nesting is
//! rejected by the scanner.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::offset::TextSpan;
use crate::{Error, Result};

/// Opening delimiter of a gold span.
pub const GOLD_OPEN: &str = "[@";
/// Opening delimiter of a suggested span.
pub const SUGGESTED_OPEN: &str = "[$";
/// Separator between text and label.
pub const LABEL_SEPARATOR: char = '#';
/// Closing delimiter.
pub const CLOSE: &str = "*]";
/// Characters added around `text#label`'s text by wrapping: `[@`, `#`, `*]`.
pub const DELIMITER_OVERHEAD: usize = 5;
/// Placeholder category used when exporting with every label collapsed.
pub const NP_LABEL: &str = "NP";

/// Gold (confirmed) or suggested (proposed) annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// User-committed annotation, `[@...*]`.
    Gold,
    /// System-proposed annotation, `[$...*]`.
    Suggested,
}

impl SpanKind {
    /// Opening delimiter.
    #[must_use]
    pub const fn opener(self) -> &'static str {
        match self {
            SpanKind::Gold => GOLD_OPEN,
            SpanKind::Suggested => SUGGESTED_OPEN,
        }
    }

    /// The marker byte following `[`.
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            SpanKind::Gold => b'@',
            SpanKind::Suggested => b'$',
        }
    }

    /// Kind for a marker byte.
    #[must_use]
    pub const fn from_marker(b: u8) -> Option<Self> {
        match b {
            b'@' => Some(SpanKind::Gold),
            b'$' => Some(SpanKind::Suggested),
            _ => None,
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanKind::Gold => write!(f, "gold"),
            SpanKind::Suggested => write!(f, "suggested"),
        }
    }
}

/// One scanned span.
///
/// Offsets are in the encoded document (delimiters included) and refer to
/// the snapshot that was scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Gold or suggested.
    pub kind: SpanKind,
    /// Text between the opener and the label separator, verbatim. For a
    /// nesting gold span this still contains the inner span's markup.
    pub text: String,
    /// Label.
    pub label: String,
    /// Location of the whole encoded span.
    pub location: TextSpan,
}

impl Span {
    /// Start offset (chars, inclusive).
    #[must_use]
    pub const fn start(&self) -> usize {
        self.location.char_start
    }

    /// End offset (chars, exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.location.char_end
    }

    /// Re-encode this span.
    #[must_use]
    pub fn encoded(&self) -> String {
        encode(self.kind, &self.text, &self.label)
    }

    /// The text a reader sees: inner markup of a nested span removed.
    #[must_use]
    pub fn surface(&self) -> Cow<'_, str> {
        if self.text.starts_with(GOLD_OPEN) {
            let decoded = crate::parser::decode(&self.text, crate::parser::Selector::Gold);
            if decoded.spans.is_empty() {
                Cow::Borrowed(&self.text)
            } else {
                Cow::Owned(decoded.text)
            }
        } else {
            Cow::Borrowed(&self.text)
        }
    }

    /// Whether `offset` (chars) falls on this span, both ends inclusive.
    #[must_use]
    pub const fn touches(&self, offset: usize) -> bool {
        self.start() <= offset && offset <= self.end()
    }
}

/// Encode a span.
///
/// ```
/// use annotag::span::{encode, SpanKind};
///
/// assert_eq!(encode(SpanKind::Gold, "Obama", "Person"), "[@Obama#Person*]");
/// assert_eq!(encode(SpanKind::Suggested, "Obama", "Person"), "[$Obama#Person*]");
/// ```
#[must_use]
pub fn encode(kind: SpanKind, text: &str, label: &str) -> String {
    let mut out = String::with_capacity(text.len() + label.len() + DELIMITER_OVERHEAD);
    out.push_str(kind.opener());
    out.push_str(text);
    out.push(LABEL_SEPARATOR);
    out.push_str(label);
    out.push_str(CLOSE);
    out
}

/// Encoded length in chars of a span wrapping `text_chars` chars with `label`.
#[must_use]
pub fn encoded_char_len(text_chars: usize, label: &str) -> usize {
    text_chars + label.chars().count() + DELIMITER_OVERHEAD
}

/// Check that `label` can be written into a span and read back unchanged.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::config("label must not be empty"));
    }
    if label.contains(LABEL_SEPARATOR) {
        return Err(Error::config(format!("label {label:?} contains '#'")));
    }
    if label.contains(CLOSE) {
        return Err(Error::config(format!("label {label:?} contains the closing delimiter")));
    }
    if label.contains(GOLD_OPEN) || label.contains(SUGGESTED_OPEN) {
        return Err(Error::config(format!("label {label:?} contains an opening delimiter")));
    }
    if label.contains(['\n', '\r']) {
        return Err(Error::config(format!("label {label:?} spans lines")));
    }
    Ok(())
}
