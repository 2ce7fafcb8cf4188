//! Chunk list to `(token, tag)` sequences.
//!
//! # Supported Schemes
//!
//! - BMES: Begin-Middle-End-Single (single-token entities use `S`) - **default**
//! - BIO: Begin-Inside-Outside (`B` always starts an entity)
//!
//! # Example
//!
//! ```rust
//! use annotag::parser::{chunks, Selector};
//! use annotag::tagger::{tag_chunks, TagOptions, TagScheme};
//!
//! let chunked = chunks("[@Barack Obama#Person*] was president.", Selector::Gold);
//! let pairs: Vec<String> = tag_chunks(&chunked.chunks, TagOptions::default())
//!     .map(|t| t.to_string())
//!     .collect();
//!
//! assert_eq!(pairs, ["Barack B-Person", "Obama E-Person", "was O", "president. O"]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::parser::Chunk;
use crate::span::NP_LABEL;
use crate::{Error, Result};

/// Tagging scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TagScheme {
    /// Begin/Middle/End/Single.
    #[default]
    #[serde(rename = "BMES", alias = "bmes")]
    Bmes,
    /// Begin/Inside.
    #[serde(rename = "BIO", alias = "bio")]
    Bio,
}

impl fmt::Display for TagScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagScheme::Bmes => write!(f, "BMES"),
            TagScheme::Bio => write!(f, "BIO"),
        }
    }
}

impl FromStr for TagScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BMES" => Ok(TagScheme::Bmes),
            "BIO" => Ok(TagScheme::Bio),
            other => Err(Error::config(format!("unknown tag scheme {other:?}"))),
        }
    }
}

/// How chunk text is split into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenization {
    /// Whitespace-separated tokens (English, segmented Chinese).
    #[default]
    Segmented,
    /// One token per character (unsegmented Chinese).
    Unsegmented,
}

/// Options for one tagging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagOptions {
    /// Tag scheme.
    pub scheme: TagScheme,
    /// Tokenization mode.
    pub tokenization: Tokenization,
    /// Replace every label with [`NP_LABEL`].
    pub only_np: bool,
}

/// A per-token tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag<'a> {
    /// Outside any entity.
    Outside,
    /// First token of a multi-token entity.
    Begin(&'a str),
    /// Interior token (BMES).
    Middle(&'a str),
    /// Last token (BMES).
    End(&'a str),
    /// Whole single-token entity (BMES).
    Single(&'a str),
    /// Non-first token (BIO).
    Inside(&'a str),
}

impl<'a> Tag<'a> {
    /// Tag prefix character.
    #[must_use]
    pub const fn prefix(&self) -> char {
        match self {
            Tag::Outside => 'O',
            Tag::Begin(_) => 'B',
            Tag::Middle(_) => 'M',
            Tag::End(_) => 'E',
            Tag::Single(_) => 'S',
            Tag::Inside(_) => 'I',
        }
    }

    /// Entity label, if inside an entity.
    #[must_use]
    pub const fn label(&self) -> Option<&'a str> {
        match *self {
            Tag::Outside => None,
            Tag::Begin(l) | Tag::Middle(l) | Tag::End(l) | Tag::Single(l) | Tag::Inside(l) => Some(l),
        }
    }

    /// Tag of token `idx` in an entity of `len` tokens.
    #[must_use]
    pub fn for_position(scheme: TagScheme, idx: usize, len: usize, label: &'a str) -> Self {
        match scheme {
            TagScheme::Bmes if len == 1 => Tag::Single(label),
            TagScheme::Bmes if idx == 0 => Tag::Begin(label),
            TagScheme::Bmes if idx + 1 == len => Tag::End(label),
            TagScheme::Bmes => Tag::Middle(label),
            TagScheme::Bio if idx == 0 => Tag::Begin(label),
            TagScheme::Bio => Tag::Inside(label),
        }
    }
}

impl fmt::Display for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            None => write!(f, "O"),
            Some(label) => write!(f, "{}-{}", self.prefix(), label),
        }
    }
}

/// One token with its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tagged<'a> {
    /// Token text.
    pub token: &'a str,
    /// Its tag.
    pub tag: Tag<'a>,
}

impl fmt::Display for Tagged<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.token, self.tag)
    }
}

/// Split `content` into tokens.
#[must_use]
pub fn tokenize(content: &str, tokenization: Tokenization) -> Vec<&str> {
    match tokenization {
        Tokenization::Segmented => content.split_whitespace().collect(),
        Tokenization::Unsegmented => content
            .char_indices()
            .map(|(i, c)| &content[i..i + c.len_utf8()])
            .collect(),
    }
}

/// Tokens of the chunk being emitted.
#[derive(Debug, Clone)]
struct Pending<'a> {
    tokens: Vec<&'a str>,
    label: Option<&'a str>,
    next: usize,
}

/// Lazy `(token, tag)` sequence over a chunk list, in document order.
///
/// A clone resumes from the same position; call [`tag_chunks`] again for a
/// fresh pass.
#[derive(Debug, Clone)]
pub struct TagStream<'a> {
    chunks: std::slice::Iter<'a, Chunk>,
    options: TagOptions,
    pending: Option<Pending<'a>>,
}

/// Tag a chunk list.
#[must_use]
pub fn tag_chunks(chunks: &[Chunk], options: TagOptions) -> TagStream<'_> {
    TagStream {
        chunks: chunks.iter(),
        options,
        pending: None,
    }
}

impl<'a> TagStream<'a> {
    fn load(&mut self, chunk: &'a Chunk) -> Pending<'a> {
        let mut tokens = tokenize(&chunk.content, self.options.tokenization);
        let label = match chunk.label.as_deref() {
            Some(_) if self.options.only_np => Some(NP_LABEL),
            other => other,
        };
        if label.is_none() {
            tokens.retain(|t| *t != " ");
        }
        Pending {
            tokens,
            label,
            next: 0,
        }
    }
}

impl<'a> Iterator for TagStream<'a> {
    type Item = Tagged<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pending) = self.pending.as_mut() {
                if let Some(&token) = pending.tokens.get(pending.next) {
                    let idx = pending.next;
                    pending.next += 1;
                    let tag = match pending.label {
                        None => Tag::Outside,
                        Some(label) => {
                            Tag::for_position(self.options.scheme, idx, pending.tokens.len(), label)
                        }
                    };
                    return Some(Tagged { token, tag });
                }
            }
            let chunk = self.chunks.next()?;
            self.pending = Some(self.load(chunk));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{chunks, Selector};

    fn render(text: &str, options: TagOptions) -> Vec<String> {
        let chunked = chunks(text, Selector::Any);
        tag_chunks(&chunked.chunks, options)
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_bmes_basic() {
        let out = render("[@Barack Obama#Person*] was president.", TagOptions::default());
        assert_eq!(out, ["Barack B-Person", "Obama E-Person", "was O", "president. O"]);
    }

    #[test]
    fn test_bmes_single_and_middle() {
        let out = render(
            "[@Obama#PER*] visited [@New York City#LOC*]",
            TagOptions::default(),
        );
        assert_eq!(
            out,
            ["Obama S-PER", "visited O", "New B-LOC", "York M-LOC", "City E-LOC"]
        );
    }

    #[test]
    fn test_bio() {
        let options = TagOptions {
            scheme: TagScheme::Bio,
            ..TagOptions::default()
        };
        let out = render("The [@United Nations Council#ORG*] met", options);
        assert_eq!(
            out,
            ["The O", "United B-ORG", "Nations I-ORG", "Council I-ORG", "met O"]
        );
    }

    #[test]
    fn test_only_np() {
        let options = TagOptions {
            only_np: true,
            ..TagOptions::default()
        };
        let out = render("[@Obama#Person*] and [$Berlin#Location*]", options);
        assert_eq!(out, ["Obama S-NP", "and O", "Berlin S-NP"]);
    }

    #[test]
    fn test_unsegmented_skips_spaces_outside() {
        let options = TagOptions {
            tokenization: Tokenization::Unsegmented,
            ..TagOptions::default()
        };
        let out = render("我 在[@北京#LOC*]", options);
        assert_eq!(out, ["我 O", "在 O", "北 B-LOC", "京 E-LOC"]);
    }

    #[test]
    fn test_unsegmented_keeps_spaces_inside_span() {
        let options = TagOptions {
            tokenization: Tokenization::Unsegmented,
            scheme: TagScheme::Bio,
            ..TagOptions::default()
        };
        let out = render("[@a b#X*]", options);
        assert_eq!(out, ["a B-X", "  I-X", "b I-X"]);
    }

    #[test]
    fn test_nested_span_exports_outer_label() {
        let out = render(
            "[@[@Obama#Person*] administration#Organization*]",
            TagOptions::default(),
        );
        assert_eq!(out, ["Obama B-Organization", "administration E-Organization"]);
    }

    #[test]
    fn test_stream_is_restartable() {
        let chunked = chunks("[@a b c#X*] d", Selector::Gold);
        let first: Vec<_> = tag_chunks(&chunked.chunks, TagOptions::default()).collect();
        let second: Vec<_> = tag_chunks(&chunked.chunks, TagOptions::default()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_empty_chunks() {
        let chunked = chunks("", Selector::Any);
        assert_eq!(tag_chunks(&chunked.chunks, TagOptions::default()).count(), 0);
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!("bio".parse::<TagScheme>().unwrap(), TagScheme::Bio);
        assert_eq!("BMES".parse::<TagScheme>().unwrap(), TagScheme::Bmes);
        assert!("IOB2".parse::<TagScheme>().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::parser::{chunks, Selector};
    use crate::span::{encode, SpanKind};
    use proptest::prelude::*;

    proptest! {
        /// One span of n tokens yields the tag counts its scheme demands.
        #[test]
        fn tag_alignment(words in prop::collection::vec("[a-z]{1,6}", 1..8), bio in any::<bool>()) {
            let text = encode(SpanKind::Gold, &words.join(" "), "L");
            let chunked = chunks(&text, Selector::Gold);
            let scheme = if bio { TagScheme::Bio } else { TagScheme::Bmes };
            let options = TagOptions { scheme, ..TagOptions::default() };
            let tags: Vec<Tag<'_>> = tag_chunks(&chunked.chunks, options).map(|t| t.tag).collect();

            let n = words.len();
            prop_assert_eq!(tags.len(), n);
            prop_assert!(tags.iter().all(|t| t.label() == Some("L")));
            let count = |p: char| tags.iter().filter(|t| t.prefix() == p).count();
            match scheme {
                TagScheme::Bmes if n == 1 => prop_assert_eq!(count('S'), 1),
                TagScheme::Bmes => {
                    prop_assert_eq!(count('B'), 1);
                    prop_assert_eq!(count('E'), 1);
                    prop_assert_eq!(count('M'), n - 2);
                }
                TagScheme::Bio => {
                    prop_assert_eq!(count('B'), 1);
                    prop_assert_eq!(count('I'), n - 1);
                }
            }
        }
    }
}
