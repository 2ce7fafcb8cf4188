//! Error types for annotag.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for annotag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for annotag operations.
///
/// Scan-level problems (overlap, malformed markup, out-of-range spans) are
/// normally collected as [`ScanIssue`](crate::parser::ScanIssue)s and only
/// logged; the variants exist so callers can surface them uniformly.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Two scanned spans overlap.
    #[error("Overlapping span: match starts at {start} before previous end {previous_end}")]
    Overlap {
        /// Start offset (chars) of the skipped match.
        start: usize,
        /// End offset (chars) of the previously accepted match.
        previous_end: usize,
    },

    /// A span opener without a well-formed body.
    #[error("Malformed span at {offset}: {reason}")]
    MalformedSpan {
        /// Offset (chars) of the opening delimiter.
        offset: usize,
        /// What was wrong.
        reason: String,
    },

    /// A span ends past the end of the document.
    #[error("Span end {end} exceeds document length {len}")]
    LengthOverflow {
        /// End offset (chars) of the span.
        end: usize,
        /// Document length (chars).
        len: usize,
    },

    /// Command character has no entry in the command map.
    #[error("Unknown command: {0:?}")]
    UnknownCommand(char),

    /// A suggestion label that no command key maps to.
    #[error("No command key maps to label {0:?}")]
    UnmappedLabel(String),

    /// Typed command string does not follow `<count><key>` groups.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Undo requested with nothing recorded.
    #[error("History is empty")]
    EmptyHistory,

    /// Export attempted on a file that is neither `.ann` nor `.txt`.
    #[error("Export only works on files ending in .ann or .txt: {}", .0.display())]
    ExportExtension(PathBuf),

    /// File was not valid in its detected encoding and was decoded lossily.
    #[error("Could not decode {} strictly, fell back to lossy UTF-8", .path.display())]
    EncodingFallback {
        /// File that was read.
        path: PathBuf,
    },

    /// Cursor or selection outside the document.
    #[error("Position {line}:{column} is outside the document")]
    InvalidCursor {
        /// Line (1-based).
        line: u32,
        /// Column (0-based, chars).
        column: u32,
    },

    /// Configuration or shortcut scheme rejected.
    #[error("Config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed span error.
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedSpan {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an invalid command error.
    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Error::InvalidCommand(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
