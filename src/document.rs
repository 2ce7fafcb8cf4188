//! Annotation file I/O.
//!
//! Files are read as UTF-8 unless a byte-order mark says otherwise; the
//! detected encoding is kept so the file is written back the same way.
//! Invalid input never fails the read: it is decoded lossily and the
//! fallback is logged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Extension of annotated files.
pub const ANN_EXTENSION: &str = "ann";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Detected file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// UTF-8 without BOM.
    #[default]
    Utf8,
    /// UTF-8 with BOM.
    Utf8Bom,
    /// UTF-16 little endian with BOM.
    Utf16Le,
    /// UTF-16 big endian with BOM.
    Utf16Be,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Bom => "utf-8-sig",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
        };
        f.write_str(name)
    }
}

impl TextEncoding {
    /// Encode `text`, BOM included.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => [UTF8_BOM, text.as_bytes()].concat(),
            TextEncoding::Utf16Le => UTF16_LE_BOM
                .iter()
                .copied()
                .chain(text.encode_utf16().flat_map(u16::to_le_bytes))
                .collect(),
            TextEncoding::Utf16Be => UTF16_BE_BOM
                .iter()
                .copied()
                .chain(text.encode_utf16().flat_map(u16::to_be_bytes))
                .collect(),
        }
    }
}

/// Decoded file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Text.
    pub text: String,
    /// Encoding to write back with.
    pub encoding: TextEncoding,
    /// Whether invalid sequences were replaced.
    pub lossy: bool,
}

fn decode_utf16(bytes: &[u8], from: fn([u8; 2]) -> u16) -> (String, bool) {
    let units = bytes.chunks(2).map(|pair| match *pair {
        [a, b] => from([a, b]),
        _ => 0xFFFD,
    });
    let mut lossy = bytes.len() % 2 != 0;
    let text = char::decode_utf16(units)
        .map(|r| {
            r.unwrap_or_else(|_| {
                lossy = true;
                char::REPLACEMENT_CHARACTER
            })
        })
        .collect();
    (text, lossy)
}

/// Decode raw file bytes.
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> Decoded {
    let (text, encoding, lossy) = if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        let text = String::from_utf8_lossy(rest);
        let lossy = matches!(text, std::borrow::Cow::Owned(_));
        (text.into_owned(), TextEncoding::Utf8Bom, lossy)
    } else if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        let (text, lossy) = decode_utf16(rest, u16::from_le_bytes);
        (text, TextEncoding::Utf16Le, lossy)
    } else if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        let (text, lossy) = decode_utf16(rest, u16::from_be_bytes);
        (text, TextEncoding::Utf16Be, lossy)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(text) => (text.to_string(), TextEncoding::Utf8, false),
            Err(_) => (
                String::from_utf8_lossy(bytes).into_owned(),
                TextEncoding::Utf8,
                true,
            ),
        }
    };
    Decoded {
        text,
        encoding,
        lossy,
    }
}

/// Read an annotation (or bare text) file.
pub fn read_document(path: &Path) -> Result<(String, TextEncoding)> {
    let bytes = fs::read(path)?;
    let decoded = decode_bytes(&bytes);
    if decoded.lossy {
        log::warn!(
            "{}",
            Error::EncodingFallback {
                path: path.to_path_buf()
            }
        );
    }
    log::debug!(
        "read {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        decoded.encoding
    );
    Ok((decoded.text, decoded.encoding))
}

/// Where the annotated version of `path` is stored: `path` itself if it
/// already ends in `.ann`, otherwise `path` with `.ann` appended.
///
/// ```
/// use annotag::document::ann_path;
/// use std::path::Path;
///
/// assert_eq!(ann_path(Path::new("a/news.ann")), Path::new("a/news.ann"));
/// assert_eq!(ann_path(Path::new("a/news.txt")), Path::new("a/news.txt.ann"));
/// ```
#[must_use]
pub fn ann_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|e| e == ANN_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ANN_EXTENSION);
    PathBuf::from(name)
}

/// Write `text` to the annotated path of `path`; returns the path written.
pub fn write_document(path: &Path, text: &str, encoding: TextEncoding) -> Result<PathBuf> {
    let target = ann_path(path);
    fs::write(&target, encoding.encode(text))?;
    log::debug!("wrote {} ({})", target.display(), encoding);
    Ok(target)
}
