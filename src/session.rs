//! Editing session: the surface an editor shell drives.
//!
//! A [`Session`] owns the document text, the cursor, the active command map
//! and the undo history. Every method either commits completely or leaves
//! the session as it was.
//!
//! ```rust
//! use annotag::command::{Target, Transaction};
//! use annotag::{AnnotatorConfig, CursorPosition, Session};
//!
//! let config = AnnotatorConfig { autosave: false, ..AnnotatorConfig::default() };
//! let mut session = Session::from_text("Obama met Obama.", config);
//!
//! let tx = Transaction::Key {
//!     target: Target::Selection {
//!         start: CursorPosition::new(1, 0),
//!         end: CursorPosition::new(1, 5),
//!     },
//!     key: 'f', // Person in the built-in map
//! };
//! let (text, _) = session.mutate(&tx).unwrap();
//! assert_eq!(text, "[@Obama#Person*] met [$Obama#Person*].");
//!
//! session.undo().unwrap();
//! assert_eq!(session.text(), "Obama met Obama.");
//! ```

use std::path::{Path, PathBuf};

use crate::command::{self, CommandMap, Transaction};
use crate::config::AnnotatorConfig;
use crate::document::{read_document, write_document, TextEncoding};
use crate::export::{export_document, ExportOptions, ExportSummary};
use crate::history::HistoryRing;
use crate::offset::CursorPosition;
use crate::parser::{chunks, scan_nested, Chunked, Selector};
use crate::recommend::strip_suggestions;
use crate::span::Span;
use crate::Result;

/// One open document.
#[derive(Debug, Clone)]
pub struct Session {
    text: String,
    path: Option<PathBuf>,
    encoding: TextEncoding,
    cursor: CursorPosition,
    commands: CommandMap,
    history: HistoryRing,
    config: AnnotatorConfig,
}

impl Session {
    /// Session over in-memory text, with the built-in command map.
    ///
    /// Nothing is written to disk until [`Session::save_as`] gives it a path.
    pub fn from_text(text: impl Into<String>, config: AnnotatorConfig) -> Self {
        Self {
            text: text.into(),
            path: None,
            encoding: TextEncoding::Utf8,
            cursor: CursorPosition::START,
            commands: CommandMap::builtin(),
            history: HistoryRing::default(),
            config,
        }
    }

    /// Open a file and load the configured scheme.
    pub fn open(path: impl AsRef<Path>, config: AnnotatorConfig) -> Result<Self> {
        let path = path.as_ref();
        let (text, encoding) = read_document(path)?;
        let commands = config.scheme_store().load(&config.scheme)?;
        log::info!(
            "opened {} ({}, {} lines, scheme {:?})",
            path.display(),
            encoding,
            text.lines().count(),
            config.scheme
        );

        let session = Self {
            text,
            path: Some(path.to_path_buf()),
            encoding,
            cursor: CursorPosition::START,
            commands,
            history: HistoryRing::default(),
            config,
        };
        session.report_issues();
        Ok(session)
    }

    /// Document text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current cursor.
    #[must_use]
    pub const fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    /// File backing the session, if any. After an autosave this is the
    /// `.ann` file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Encoding the file is written back with.
    #[must_use]
    pub const fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Active command map.
    #[must_use]
    pub const fn commands(&self) -> &CommandMap {
        &self.commands
    }

    /// Settings.
    #[must_use]
    pub const fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Number of undo steps available.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Move the cursor.
    pub fn set_cursor(&mut self, cursor: CursorPosition) -> Result<()> {
        cursor.to_char_offset(&self.text)?;
        self.cursor = cursor;
        Ok(())
    }

    /// Chunk structure of the document, gold and suggested spans included.
    #[must_use]
    pub fn chunks(&self) -> Chunked {
        chunks(&self.text, Selector::Any)
    }

    /// Gold spans nested inside other gold spans, for highlighting.
    #[must_use]
    pub fn nested_spans(&self) -> Vec<Span> {
        scan_nested(&self.text)
    }

    fn report_issues(&self) {
        for issue in self.chunks().issues {
            log::warn!("{issue}");
        }
    }

    /// Persist `text` if autosave is on; returns the path written.
    fn persist(&self, text: &str) -> Result<Option<PathBuf>> {
        match &self.path {
            Some(path) if self.config.autosave => {
                write_document(path, text, self.encoding).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn commit(&mut self, text: String, cursor: CursorPosition, written: Option<PathBuf>) {
        self.text = text;
        self.cursor = cursor;
        if let Some(path) = written {
            self.path = Some(path);
        }
        self.report_issues();
    }

    /// Apply one edit transaction.
    ///
    /// On success the previous text is pushed to the history together with
    /// the cursor the transaction was issued from. On error the session is
    /// unchanged.
    pub fn mutate(&mut self, transaction: &Transaction) -> Result<(&str, CursorPosition)> {
        let outcome = command::execute(
            &self.text,
            transaction,
            &self.commands,
            self.config.recommend,
        )?;
        if outcome.text != self.text {
            let written = self.persist(&outcome.text)?;
            self.history.push(self.text.clone(), transaction.cursor());
            self.commit(outcome.text, outcome.cursor, written);
        } else {
            self.cursor = outcome.cursor;
        }
        log::debug!("mutate -> cursor {}", self.cursor);
        Ok((self.text.as_str(), self.cursor))
    }

    /// Restore the most recent snapshot.
    pub fn undo(&mut self) -> Result<(&str, CursorPosition)> {
        let entry = self.history.pop()?;
        let written = match self.persist(&entry.content) {
            Ok(written) => written,
            Err(e) => {
                self.history.push(entry.content, entry.cursor);
                return Err(e);
            }
        };
        self.commit(entry.content, entry.cursor, written);
        Ok((self.text.as_str(), self.cursor))
    }

    /// Export with explicit settings.
    pub fn export_with(&self, options: &ExportOptions) -> Result<ExportSummary> {
        let source = self.path.as_deref().ok_or_else(|| {
            crate::Error::config("session has no file to export next to")
        })?;
        export_document(source, &self.text, options)
    }

    /// Export with the configured settings.
    pub fn export(&self) -> Result<ExportSummary> {
        self.export_with(&self.config.export_options())
    }

    /// Turn recommendation on or off.
    ///
    /// Turning it off strips every suggestion and moves the cursor to the
    /// start; turning it on re-runs recommendation after the cursor line.
    pub fn toggle_recommend(&mut self, enabled: bool) -> Result<&str> {
        let (text, cursor) = if enabled {
            let outcome = command::refresh(&self.text, self.cursor, true)?;
            (outcome.text, outcome.cursor)
        } else {
            (strip_suggestions(&self.text), CursorPosition::START)
        };
        let written = if text == self.text { None } else { self.persist(&text)? };
        self.config.recommend = enabled;
        self.commit(text, cursor, written);
        log::info!("recommendation {}", if enabled { "on" } else { "off" });
        Ok(self.text.as_str())
    }

    /// Replace the command map with the named scheme.
    pub fn load_scheme(&mut self, name: &str) -> Result<()> {
        let commands = self.config.scheme_store().load(name)?;
        log::info!("switched to scheme {name:?} ({} keys)", commands.len());
        self.commands = commands;
        self.config.scheme = name.to_string();
        Ok(())
    }

    /// Replace the command map directly.
    pub fn set_commands(&mut self, commands: CommandMap) {
        self.commands = commands;
    }

    /// Save the active command map as a scheme.
    pub fn save_scheme(&self, name: &str) -> Result<PathBuf> {
        self.config.scheme_store().save(name, &self.commands)
    }

    /// Write the document to `path` (as `.ann`) and keep editing that file.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let written = write_document(path.as_ref(), &self.text, self.encoding)?;
        self.path = Some(written.clone());
        Ok(written)
    }
}
