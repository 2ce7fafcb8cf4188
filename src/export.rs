//! Sequence-tagging export (`.anns`).
//!
//! Each source line becomes a block of `token tag` lines followed by a
//! blank line. Blank source lines become a single blank line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::read_document;
use crate::parser::{chunks, Selector};
use crate::recommend::strip_suggestions;
use crate::tagger::{tag_chunks, TagOptions, TagScheme, Tokenization};
use crate::{Error, Result};

/// Extension of exported files.
pub const EXPORT_EXTENSION: &str = "anns";

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Tokenization.
    pub tokenization: Tokenization,
    /// Tag scheme.
    pub tag_scheme: TagScheme,
    /// Collapse labels to `NP`.
    pub only_np: bool,
    /// Export suggested spans as entities; when false they are plain text.
    pub keep_recommend: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tokenization: Tokenization::Segmented,
            tag_scheme: TagScheme::Bmes,
            only_np: false,
            keep_recommend: true,
        }
    }
}

impl ExportOptions {
    fn tag_options(&self) -> TagOptions {
        TagOptions {
            scheme: self.tag_scheme,
            tokenization: self.tokenization,
            only_np: self.only_np,
        }
    }
}

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Output file.
    pub path: PathBuf,
    /// Source line count.
    pub line_count: usize,
    /// Settings used.
    pub options: ExportOptions,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tag scheme:  {}", self.options.tag_scheme)?;
        writeln!(f, "Keep recom:  {}", self.options.keep_recommend)?;
        writeln!(
            f,
            "Segmented:   {}",
            self.options.tokenization == Tokenization::Segmented
        )?;
        writeln!(f, "Only NP:     {}", self.options.only_np)?;
        writeln!(f, "Line number: {}", self.line_count)?;
        write!(f, "Saved to:    {}", self.path.display())
    }
}

/// Output path for exporting `source`.
///
/// Only `.ann` and `.txt` sources are accepted. A trailing `.ann` is
/// replaced, anything else gets `.anns` appended.
///
/// ```
/// use annotag::export::export_path;
/// use std::path::Path;
///
/// assert_eq!(export_path(Path::new("news.txt.ann")).unwrap(), Path::new("news.txt.anns"));
/// assert_eq!(export_path(Path::new("news.txt")).unwrap(), Path::new("news.txt.anns"));
/// assert!(export_path(Path::new("news.md")).is_err());
/// ```
pub fn export_path(source: &Path) -> Result<PathBuf> {
    match source.extension().and_then(|e| e.to_str()) {
        Some("ann") => Ok(source.with_extension(EXPORT_EXTENSION)),
        Some("txt") => {
            let mut name = source.as_os_str().to_os_string();
            name.push(".");
            name.push(EXPORT_EXTENSION);
            Ok(PathBuf::from(name))
        }
        _ => Err(Error::ExportExtension(source.to_path_buf())),
    }
}

/// Append the `token tag` block for one non-blank line.
fn export_line(line: &str, options: &ExportOptions, out: &mut String) {
    let stripped;
    let (line, selector) = if options.keep_recommend {
        (line, Selector::Any)
    } else {
        stripped = strip_suggestions(line);
        (stripped.as_str(), Selector::Gold)
    };

    let chunked = chunks(line, selector);
    for issue in &chunked.issues {
        log::warn!("export: {issue} in line {line:?}");
    }
    for tagged in tag_chunks(&chunked.chunks, options.tag_options()) {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{tagged}");
    }
}

/// Convert a whole annotated document to export format.
///
/// ```
/// use annotag::export::{export_text, ExportOptions};
///
/// let out = export_text("[@Barack Obama#Person*] was president.\n", &ExportOptions::default());
/// assert_eq!(out, "Barack B-Person\nObama E-Person\nwas O\npresident. O\n\n");
/// ```
#[must_use]
pub fn export_text(text: &str, options: &ExportOptions) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push('\n');
            continue;
        }
        export_line(line, options, &mut out);
        out.push('\n');
    }
    out
}

/// Export the annotation file at `source` next to it.
///
/// Nothing is written if the extension check fails.
pub fn export_file(source: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    export_path(source)?;
    let (text, _) = read_document(source)?;
    export_document(source, &text, options)
}

/// Export `text`, the current contents of `source`, next to `source`.
pub fn export_document(source: &Path, text: &str, options: &ExportOptions) -> Result<ExportSummary> {
    let target = export_path(source)?;
    fs::write(&target, export_text(text, options))?;

    let summary = ExportSummary {
        path: target,
        line_count: text.lines().count(),
        options: *options,
    };
    log::info!(
        "exported {} lines to {} ({}, segmented={}, keep_recommend={})",
        summary.line_count,
        summary.path.display(),
        options.tag_scheme,
        options.tokenization == Tokenization::Segmented,
        options.keep_recommend
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines() {
        let out = export_text("a\n\n  \nb", &ExportOptions::default());
        assert_eq!(out, "a O\n\n\n\nb O\n\n");
    }

    #[test]
    fn test_keep_recommend() {
        let text = "[$Obama#Person*] spoke";
        let kept = export_text(text, &ExportOptions::default());
        assert_eq!(kept, "Obama S-Person\nspoke O\n\n");

        let options = ExportOptions {
            keep_recommend: false,
            ..ExportOptions::default()
        };
        assert_eq!(export_text(text, &options), "Obama O\nspoke O\n\n");
    }

    #[test]
    fn test_bio_only_np_unsegmented() {
        let options = ExportOptions {
            tokenization: Tokenization::Unsegmented,
            tag_scheme: TagScheme::Bio,
            only_np: true,
            keep_recommend: true,
        };
        assert_eq!(
            export_text("在[@北京市#LOC*]", &options),
            "在 O\n北 B-NP\n京 I-NP\n市 I-NP\n\n"
        );
    }

    #[test]
    fn test_malformed_left_as_text() {
        let out = export_text("[@Obama#*] x", &ExportOptions::default());
        assert_eq!(out, "[@Obama#*] O\nx O\n\n");
    }

    #[test]
    fn test_crlf_lines() {
        let out = export_text("a\r\nb\r\n", &ExportOptions::default());
        assert_eq!(out, "a O\n\nb O\n\n");
    }

    #[test]
    fn test_export_rejects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes.md");
        fs::write(&src, "x").unwrap();
        let err = export_file(&src, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ExportExtension(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("doc.ann");
        fs::write(&src, "[@Obama#Person*] spoke\n\nok\n").unwrap();

        let summary = export_file(&src, &ExportOptions::default()).unwrap();
        assert_eq!(summary.path, dir.path().join("doc.anns"));
        assert_eq!(summary.line_count, 3);
        assert_eq!(
            fs::read_to_string(&summary.path).unwrap(),
            "Obama S-Person\nspoke O\n\n\nok O\n\n"
        );
    }
}
