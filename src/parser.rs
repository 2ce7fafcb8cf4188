//! Span scanning and chunking.
//!
//! The scanner is an explicit state machine over bytes:
//!
//! ```text
//!   OutsideSpan ──'['──▶ InOpenDelim ──'@'|'$'──▶ InText ──'#'──▶ InLabel ──"*]"──▶ Closed
//!        ▲                    │                      │  ▲            │   │
//!        └──── other ─────────┘                      │  └──'#'(again)┘   │
//!                                      '\n', EOF, "[@", "[$" ───▶ malformed ◀──┘
//! ```
//!
//! A malformed candidate is reported and scanning resumes one byte after its
//! opening bracket, so an enclosed well-formed span is still found. Accepted
//! spans never overlap: scanning resumes at the end of the last match.
//!
//! [`chunks_from_spans`] partitions the document into labeled and unlabeled
//! chunks. It also accepts span lists that did not come from a single scan,
//! which is where overlaps and out-of-range spans are detected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::offset::{SpanConverter, TextSpan};
use crate::span::{Span, SpanKind, CLOSE, GOLD_OPEN, LABEL_SEPARATOR};
use crate::Error;

/// Which span kinds a scan recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    /// Gold spans only.
    Gold,
    /// Suggested spans only.
    Suggested,
    /// Gold and suggested spans.
    #[default]
    Any,
}

impl Selector {
    /// Whether spans of `kind` are recognized.
    #[must_use]
    pub const fn accepts(self, kind: SpanKind) -> bool {
        matches!(
            (self, kind),
            (Selector::Any, _)
                | (Selector::Gold, SpanKind::Gold)
                | (Selector::Suggested, SpanKind::Suggested)
        )
    }
}

/// A recoverable problem found while scanning or chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ScanIssue {
    /// Match starts before the previous match ended; it was skipped.
    Overlap {
        /// Start (chars) of the skipped match.
        start: usize,
        /// End (chars) of the previous match.
        previous_end: usize,
    },
    /// Opening delimiter without a well-formed body; left as plain text.
    Malformed {
        /// Offset (chars) of the opening bracket.
        offset: usize,
        /// What was wrong.
        reason: &'static str,
    },
    /// Span ends past the end of the document; it was skipped.
    Length {
        /// End (chars) of the span.
        end: usize,
        /// Document length (chars).
        len: usize,
    },
}

impl ScanIssue {
    /// Convert into the crate error type.
    #[must_use]
    pub fn into_error(self) -> Error {
        match self {
            ScanIssue::Overlap {
                start,
                previous_end,
            } => Error::Overlap {
                start,
                previous_end,
            },
            ScanIssue::Malformed { offset, reason } => Error::malformed(offset, reason),
            ScanIssue::Length { end, len } => Error::LengthOverflow { end, len },
        }
    }
}

impl fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clone().into_error())
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scan {
    /// Accepted spans, ordered by start, non-overlapping.
    pub spans: Vec<Span>,
    /// Problems that were skipped over.
    pub issues: Vec<ScanIssue>,
}

/// Partition unit for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Plain text, or the decoded surface text of a span.
    pub content: String,
    /// Where the chunk sits in the encoded document.
    pub location: TextSpan,
    /// Label of a span chunk.
    pub label: Option<String>,
    /// Kind of a span chunk.
    pub kind: Option<SpanKind>,
}

impl Chunk {
    /// Whether this chunk came from a span.
    #[must_use]
    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }

    /// Start offset (chars).
    #[must_use]
    pub const fn start(&self) -> usize {
        self.location.char_start
    }

    /// End offset (chars).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.location.char_end
    }

    fn plain(text: &str, location: TextSpan) -> Self {
        Self {
            content: location.extract(text).to_string(),
            location,
            label: None,
            kind: None,
        }
    }
}

/// Chunk list plus the issues found while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Chunked {
    /// Contiguous chunks covering the whole document.
    pub chunks: Vec<Chunk>,
    /// Scan and chunking issues.
    pub issues: Vec<ScanIssue>,
}

// =============================================================================
// Scanner
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InOpenDelim,
    InText,
    InLabel,
    Closed,
}

/// Byte ranges of one accepted span.
#[derive(Debug, Clone)]
struct RawMatch {
    kind: SpanKind,
    whole: Range<usize>,
    text: Range<usize>,
    label: Range<usize>,
    /// Whole range of a nested gold span at the start of `text`.
    nested: Option<Range<usize>>,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    selector: Selector,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, selector: Selector) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            selector,
        }
    }

    fn at(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    fn opens_span(&self, i: usize) -> bool {
        self.at(i) == Some(b'[') && self.at(i + 1).and_then(SpanKind::from_marker).is_some()
    }

    fn closes_span(&self, i: usize) -> bool {
        self.at(i) == Some(b'*') && self.at(i + 1) == Some(b']')
    }

    /// Match a span whose `[` sits at `start`.
    ///
    /// `inner` is set while matching the nested prefix of a gold span: no
    /// further nesting is allowed and the first `*]` closes unconditionally.
    fn match_at(&self, start: usize, inner: bool) -> Result<RawMatch, &'static str> {
        let mut state = State::InOpenDelim;
        let mut i = start + 1;
        let mut kind = SpanKind::Gold;
        let mut text_start = i;
        let mut nested = None;
        let mut separator = None;

        loop {
            match state {
                State::InOpenDelim => {
                    kind = self
                        .at(i)
                        .and_then(SpanKind::from_marker)
                        .ok_or("missing span marker")?;
                    i += 1;
                    text_start = i;
                    if !inner && kind == SpanKind::Gold && self.bytes[i..].starts_with(GOLD_OPEN.as_bytes()) {
                        if let Ok(m) = self.match_at(i, true) {
                            i = m.whole.end;
                            nested = Some(m.whole);
                        }
                    }
                    state = State::InText;
                }
                State::InText => match self.at(i) {
                    None | Some(b'\n') | Some(b'\r') => return Err("missing closing delimiter"),
                    Some(b'#') => {
                        separator = Some(i);
                        state = State::InLabel;
                        i += 1;
                    }
                    _ if self.opens_span(i) => return Err("opening delimiter inside span text"),
                    _ if self.closes_span(i) => return Err("missing label separator"),
                    _ => i += 1,
                },
                State::InLabel => match self.at(i) {
                    None | Some(b'\n') | Some(b'\r') => return Err("missing closing delimiter"),
                    Some(b'#') => {
                        separator = Some(i);
                        i += 1;
                    }
                    _ if self.closes_span(i) => {
                        if !inner && self.at(i + 2) == Some(LABEL_SEPARATOR as u8) {
                            return Err("closing delimiter followed by '#'");
                        }
                        state = State::Closed;
                    }
                    _ if self.opens_span(i) => return Err("opening delimiter inside label"),
                    _ => i += 1,
                },
                State::Closed => {
                    let sep = separator.ok_or("missing label separator")?;
                    if sep == text_start {
                        return Err("empty span text");
                    }
                    if sep + 1 == i {
                        return Err("empty label");
                    }
                    return Ok(RawMatch {
                        kind,
                        whole: start..i + CLOSE.len(),
                        text: text_start..sep,
                        label: sep + 1..i,
                        nested,
                    });
                }
            }
        }
    }

    /// Left-to-right scan collecting raw matches and malformed reports.
    fn run(&self) -> (Vec<RawMatch>, Vec<(usize, &'static str)>) {
        let mut matches = Vec::new();
        let mut malformed = Vec::new();
        let mut i = 0;

        while let Some(rel) = self.bytes[i..].iter().position(|&b| b == b'[') {
            let pos = i + rel;
            let wanted = self
                .at(pos + 1)
                .and_then(SpanKind::from_marker)
                .is_some_and(|kind| self.selector.accepts(kind));
            if !wanted {
                i = pos + 1;
                continue;
            }
            match self.match_at(pos, false) {
                Ok(m) => {
                    i = m.whole.end;
                    matches.push(m);
                }
                Err(reason) => {
                    malformed.push((pos, reason));
                    i = pos + 1;
                }
            }
        }
        (matches, malformed)
    }

    fn to_span(&self, conv: &SpanConverter, m: &RawMatch) -> Span {
        Span {
            kind: m.kind,
            text: self.text[m.text.clone()].to_string(),
            label: self.text[m.label.clone()].to_string(),
            location: conv.from_bytes(m.whole.start, m.whole.end),
        }
    }
}

// =============================================================================
// Public entry points
// =============================================================================

/// Scan `text` for spans of the selected kinds.
///
/// ```
/// use annotag::parser::{scan, Selector};
///
/// let scan = scan("[@Barack Obama#Person*] was president.", Selector::Gold);
/// assert_eq!(scan.spans.len(), 1);
/// assert_eq!(scan.spans[0].text, "Barack Obama");
/// assert_eq!(scan.spans[0].label, "Person");
/// assert_eq!(scan.spans[0].end(), 23);
/// ```
#[must_use]
pub fn scan(text: &str, selector: Selector) -> Scan {
    let scanner = Scanner::new(text, selector);
    let (matches, malformed) = scanner.run();
    let conv = SpanConverter::new(text);

    Scan {
        spans: matches.iter().map(|m| scanner.to_span(&conv, m)).collect(),
        issues: malformed
            .into_iter()
            .map(|(pos, reason)| ScanIssue::Malformed {
                offset: conv.byte_to_char(pos),
                reason,
            })
            .collect(),
    }
}

/// Locate gold spans nested at the start of other gold spans.
///
/// Offsets refer to `text`; the chunk structure is unaffected. Used for
/// highlighting the innermost span.
#[must_use]
pub fn scan_nested(text: &str) -> Vec<Span> {
    let scanner = Scanner::new(text, Selector::Gold);
    let (matches, _) = scanner.run();
    let conv = SpanConverter::new(text);

    matches
        .iter()
        .filter_map(|m| m.nested.clone())
        .filter_map(|range| scanner.match_at(range.start, true).ok())
        .map(|m| scanner.to_span(&conv, &m))
        .collect()
}

/// Parse a string that is exactly one well-formed span.
#[must_use]
pub fn parse_one(encoded: &str) -> Option<Span> {
    let mut found = scan(encoded, Selector::Any);
    if found.spans.len() != 1 {
        return None;
    }
    let span = found.spans.pop()?;
    (span.location.byte_start == 0 && span.location.byte_end == encoded.len()).then_some(span)
}

/// Build chunks from a scan of `text`.
#[must_use]
pub fn chunks(text: &str, selector: Selector) -> Chunked {
    let scanned = scan(text, selector);
    let mut chunked = chunks_from_spans(text, &scanned.spans);
    let mut issues = scanned.issues;
    issues.append(&mut chunked.issues);
    chunked.issues = issues;
    chunked
}

/// Partition `text` around `spans` (expected in document order).
///
/// Chunks are contiguous and cover the document exactly once. Spans that
/// start before the previous accepted span ends, or end past the document,
/// are skipped and reported.
#[must_use]
pub fn chunks_from_spans(text: &str, spans: &[Span]) -> Chunked {
    let len = text.chars().count();
    let mut chunks = Vec::with_capacity(spans.len() * 2 + 1);
    let mut issues = Vec::new();
    let mut cursor = TextSpan {
        byte_start: 0,
        byte_end: 0,
        char_start: 0,
        char_end: 0,
    };

    for span in spans {
        if span.end() > len || span.location.byte_end > text.len() {
            issues.push(ScanIssue::Length {
                end: span.end(),
                len,
            });
            continue;
        }
        if span.start() < cursor.char_end {
            issues.push(ScanIssue::Overlap {
                start: span.start(),
                previous_end: cursor.char_end,
            });
            continue;
        }
        if span.start() > cursor.char_end {
            let gap = TextSpan {
                byte_start: cursor.byte_end,
                byte_end: span.location.byte_start,
                char_start: cursor.char_end,
                char_end: span.start(),
            };
            chunks.push(Chunk::plain(text, gap));
        }
        chunks.push(Chunk {
            content: span.surface().into_owned(),
            location: span.location,
            label: Some(span.label.clone()),
            kind: Some(span.kind),
        });
        cursor = span.location;
    }

    if cursor.char_end < len || chunks.is_empty() {
        let tail = TextSpan {
            byte_start: cursor.byte_end,
            byte_end: text.len(),
            char_start: cursor.char_end,
            char_end: len,
        };
        chunks.push(Chunk::plain(text, tail));
    }

    Chunked { chunks, issues }
}

// =============================================================================
// Decoding
// =============================================================================

/// A span located in decoded (markup-free) text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedSpan {
    /// Gold or suggested.
    pub kind: SpanKind,
    /// Label.
    pub label: String,
    /// Location in the decoded text.
    pub location: TextSpan,
}

/// Text with the markup of the selected kinds removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    /// Plain text.
    pub text: String,
    /// Removed spans, located in `text`.
    pub spans: Vec<DecodedSpan>,
}

/// Strip markup of the selected kinds, keeping each span's surface text.
///
/// ```
/// use annotag::parser::{decode, Selector};
///
/// let decoded = decode("[@Obama#Person*] met [$Merkel#Person*].", Selector::Suggested);
/// assert_eq!(decoded.text, "[@Obama#Person*] met Merkel.");
/// assert_eq!(decoded.spans.len(), 1);
/// ```
#[must_use]
pub fn decode(text: &str, selector: Selector) -> Decoded {
    let scanned = scan(text, selector);
    let mut out = String::with_capacity(text.len());
    let mut spans = Vec::with_capacity(scanned.spans.len());
    let mut last = 0;
    let mut out_chars = 0;

    for span in &scanned.spans {
        let gap = &text[last..span.location.byte_start];
        out.push_str(gap);
        out_chars += gap.chars().count();

        let surface = span.surface();
        let byte_start = out.len();
        out.push_str(&surface);
        let width = surface.chars().count();
        spans.push(DecodedSpan {
            kind: span.kind,
            label: span.label.clone(),
            location: TextSpan {
                byte_start,
                byte_end: out.len(),
                char_start: out_chars,
                char_end: out_chars + width,
            },
        });
        out_chars += width;
        last = span.location.byte_end;
    }
    out.push_str(&text[last..]);

    Decoded { text: out, spans }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(scan: &Scan) -> Vec<(&str, &str)> {
        scan.spans
            .iter()
            .map(|s| (s.text.as_str(), s.label.as_str()))
            .collect()
    }

    #[test]
    fn test_scan_gold_and_suggested() {
        let text = "[@Obama#Person*] met [$Merkel#Person*] in [@Berlin#Location*].";

        let gold = scan(text, Selector::Gold);
        assert_eq!(labels(&gold), vec![("Obama", "Person"), ("Berlin", "Location")]);

        let suggested = scan(text, Selector::Suggested);
        assert_eq!(labels(&suggested), vec![("Merkel", "Person")]);
        assert_eq!(suggested.spans[0].kind, SpanKind::Suggested);

        let any = scan(text, Selector::Any);
        assert_eq!(any.spans.len(), 3);
        assert!(any.issues.is_empty());
    }

    #[test]
    fn test_hash_in_text_goes_to_text() {
        let found = scan("[@C#Sharp#Language*]", Selector::Gold);
        assert_eq!(labels(&found), vec![("C#Sharp", "Language")]);
        assert_eq!(found.spans[0].encoded(), "[@C#Sharp#Language*]");
    }

    #[test]
    fn test_offsets_are_chars() {
        let text = "Zoë [@Zürich#Location*]!";
        let found = scan(text, Selector::Gold);
        assert_eq!(found.spans[0].start(), 4);
        assert_eq!(found.spans[0].end(), 23);
        assert_eq!(found.spans[0].location.extract(text), "[@Zürich#Location*]");
    }

    #[test]
    fn test_nested_prefix() {
        let text = "[@[@Obama#Person*] administration#Organization*] said";
        let found = scan(text, Selector::Gold);
        assert_eq!(found.spans.len(), 1);
        assert_eq!(found.spans[0].text, "[@Obama#Person*] administration");
        assert_eq!(found.spans[0].label, "Organization");
        assert_eq!(found.spans[0].surface(), "Obama administration");

        let inner = scan_nested(text);
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].text, "Obama");
        assert_eq!(inner[0].start(), 2);
        assert_eq!(inner[0].end(), 18);
    }

    #[test]
    fn test_nested_followed_by_hash() {
        let text = "[@[@Obama#Person*]#Name*]";
        let found = scan(text, Selector::Gold);
        assert_eq!(labels(&found), vec![("[@Obama#Person*]", "Name")]);
        assert_eq!(found.spans[0].surface(), "Obama");
    }

    #[test]
    fn test_deeper_nesting_rejected() {
        let text = "[@[@[@A#x*]#y*]#z*]";
        let found = scan(text, Selector::Gold);
        // every candidate is rejected, nothing is highlighted
        assert!(found.spans.is_empty());
        assert!(matches!(found.issues[0], ScanIssue::Malformed { offset: 0, .. }));
        assert!(found
            .issues
            .iter()
            .all(|i| matches!(i, ScanIssue::Malformed { .. })));
    }

    #[test]
    fn test_double_tag_rejected() {
        let found = scan("[@A#x*]#y*] rest", Selector::Gold);
        assert!(found.spans.is_empty());
        assert_eq!(
            found.issues,
            vec![ScanIssue::Malformed {
                offset: 0,
                reason: "closing delimiter followed by '#'"
            }]
        );
    }

    #[test]
    fn test_malformed_variants() {
        for (text, reason) in [
            ("[@Obama#Person", "missing closing delimiter"),
            ("[@Obama*] x", "missing label separator"),
            ("[@Obama#*]", "empty label"),
            ("[@#Person*]", "empty span text"),
            ("[@Oba\nma#Person*]", "missing closing delimiter"),
            ("[@a [$b#c*]#d*]", "opening delimiter inside span text"),
        ] {
            let found = scan(text, Selector::Any);
            assert!(
                found.issues.iter().any(|i| matches!(i, ScanIssue::Malformed { offset: 0, reason: r } if *r == reason)),
                "{text:?}: {:?}",
                found.issues
            );
        }
    }

    #[test]
    fn test_malformed_does_not_hide_later_span() {
        let found = scan("[@broken and [@Obama#Person*]", Selector::Gold);
        assert_eq!(labels(&found), vec![("Obama", "Person")]);
        assert_eq!(found.issues.len(), 1);
    }

    #[test]
    fn test_unselected_kind_is_plain() {
        let found = scan("[$Obama#Person*]", Selector::Gold);
        assert!(found.spans.is_empty());
        assert!(found.issues.is_empty());
    }

    #[test]
    fn test_parse_one() {
        let span = parse_one("[@Barack Obama#Person*]").unwrap();
        assert_eq!(span.text, "Barack Obama");
        assert!(parse_one("[@Barack Obama#Person*] ").is_none());
        assert!(parse_one("x[@Obama#Person*]").is_none());
        assert!(parse_one("Obama").is_none());
    }

    #[test]
    fn test_chunks_basic() {
        let text = "[@Barack Obama#Person*] was president.";
        let chunked = chunks(text, Selector::Gold);

        assert_eq!(chunked.chunks.len(), 2);
        assert_eq!(chunked.chunks[0].content, "Barack Obama");
        assert_eq!(chunked.chunks[0].label.as_deref(), Some("Person"));
        assert_eq!(chunked.chunks[1].content, " was president.");
        assert!(!chunked.chunks[1].is_labeled());
        assert_eq!(chunked.chunks[1].start(), 23);
    }

    #[test]
    fn test_chunks_empty_document() {
        let chunked = chunks("", Selector::Any);
        assert_eq!(chunked.chunks.len(), 1);
        assert_eq!(chunked.chunks[0].content, "");
        assert!(!chunked.chunks[0].is_labeled());
    }

    #[test]
    fn test_chunks_adjacent_spans() {
        let chunked = chunks("[@a#X*][@b#Y*]", Selector::Gold);
        assert_eq!(chunked.chunks.len(), 2);
        assert!(chunked.chunks.iter().all(Chunk::is_labeled));
    }

    #[test]
    fn test_chunks_overlap_and_length() {
        let text = "[@a#X*] tail";
        let first = scan(text, Selector::Gold).spans.remove(0);
        let mut overlapping = first.clone();
        overlapping.location = TextSpan::from_chars(text, 3, 8);
        let mut too_long = first.clone();
        too_long.location.char_end = 99;

        let chunked = chunks_from_spans(text, &[first, overlapping, too_long]);
        assert_eq!(
            chunked.issues,
            vec![
                ScanIssue::Overlap { start: 3, previous_end: 7 },
                ScanIssue::Length { end: 99, len: 12 },
            ]
        );
        assert_eq!(chunked.chunks.len(), 2);
        assert_eq!(chunked.chunks[1].content, " tail");
    }

    #[test]
    fn test_decode_offsets() {
        let decoded = decode("Hi [@Zoë#Person*] and [@Obama#Person*]", Selector::Gold);
        assert_eq!(decoded.text, "Hi Zoë and Obama");
        assert_eq!(decoded.spans[0].location.char_range(), 3..6);
        assert_eq!(decoded.spans[1].location.char_range(), 11..16);
        assert_eq!(decoded.spans[1].location.extract(&decoded.text), "Obama");
    }

    #[test]
    fn test_issue_display() {
        let issue = ScanIssue::Overlap { start: 3, previous_end: 7 };
        assert!(issue.to_string().contains("before previous end 7"));
    }
}
