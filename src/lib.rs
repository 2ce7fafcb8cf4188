//! # annotag
//!
//! Entity-span annotation over plain text.
//!
//! Annotations live inline, in the text itself:
//!
//! ```text
//! [@Barack Obama#Person*] visited [$Berlin#Location*].
//! ```
//!
//! `[@...*]` is a gold (confirmed) span, `[$...*]` a suggestion produced
//! from the document's own gold spans.
//!
//! - **Parsing**: [`parser`] scans spans with char offsets and splits text
//!   into labeled/unlabeled chunks
//! - **Tagging**: [`tagger`] turns chunks into BMES or BIO token/tag pairs
//! - **Suggestions**: [`recommend`] annotates unannotated text by greedy
//!   longest match against a dictionary of confirmed spans
//! - **Editing**: [`command`] applies shortcut keys to a selection, a
//!   cursor position, or a typed `<count><key>` command
//! - **Sessions**: [`Session`] ties a document, its `.ann` file, a
//!   20-entry undo history, and `.anns` export together
//!
//! ## Quick Start
//!
//! ```rust
//! use annotag::parser::{chunks, Selector};
//! use annotag::tagger::{tag_chunks, TagOptions};
//!
//! let text = "[@Barack Obama#Person*] spoke";
//! let chunked = chunks(text, Selector::Any);
//! let pairs: Vec<String> = tag_chunks(&chunked.chunks, TagOptions::default())
//!     .map(|t| t.to_string())
//!     .collect();
//! assert_eq!(pairs, ["Barack B-Person", "Obama E-Person", "spoke O"]);
//! ```
//!
//! ## Editing a document
//!
//! See [`Session`] for a walkthrough: open a file, apply keys, undo,
//! export.
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! annotag = { version = "0.3", default-features = false }  # library only
//! annotag = "0.3"                                          # + `annotag` binary
//! ```

#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod document;
mod error;
pub mod export;
pub mod history;
pub mod offset;
pub mod parser;
pub mod recommend;
pub mod session;
pub mod span;
pub mod tagger;

#[cfg(feature = "cli")]
pub mod cli;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use annotag::prelude::*;
    //!
    //! let chunked = chunks("[$Berlin#Location*] is big", Selector::Any);
    //! assert_eq!(chunked.chunks[0].label.as_deref(), Some("Location"));
    //! assert_eq!(chunked.chunks[0].kind, Some(SpanKind::Suggested));
    //! ```
    pub use crate::command::{CommandMap, Target, Transaction};
    pub use crate::config::AnnotatorConfig;
    pub use crate::error::{Error, Result};
    pub use crate::export::ExportOptions;
    pub use crate::offset::CursorPosition;
    pub use crate::parser::{chunks, scan, Chunk, Selector};
    pub use crate::session::Session;
    pub use crate::span::{Span, SpanKind};
    pub use crate::tagger::{tag_chunks, TagOptions, TagScheme, Tokenization};
}

// Re-exports
pub use command::{CommandMap, EditOutcome, Target, Transaction};
pub use config::{AnnotatorConfig, SchemeStore};
pub use document::TextEncoding;
pub use error::{Error, Result};
pub use export::{ExportOptions, ExportSummary};
pub use history::{HistoryEntry, HistoryRing, HISTORY_CAPACITY};
pub use offset::{CursorPosition, SpanConverter, TextSpan};
pub use parser::{Chunk, Chunked, ScanIssue, Selector};
pub use recommend::RecommendDictionary;
pub use session::Session;
pub use span::{Span, SpanKind};
pub use tagger::{Tag, TagScheme, Tagged, Tokenization};
