//! Dictionary-driven span suggestion.
//!
//! Gold spans in the confirmed part of a document teach a surface → label
//! dictionary; the pending part is then scanned with greedy longest match
//! and every hit is wrapped as a suggested span.
//!
//! ```rust
//! use annotag::recommend::merge;
//!
//! let merged = merge("[@Obama#Person*] arrived. ", "Obama spoke.", true);
//! assert_eq!(merged, "[@Obama#Person*] arrived. [$Obama#Person*] spoke.");
//! ```

use std::collections::{BTreeSet, HashMap};

use crate::parser::{decode, parse_one, scan, Selector};
use crate::span::{encode, SpanKind, LABEL_SEPARATOR};

/// Surface string → label, built from gold spans.
#[derive(Debug, Clone, Default)]
pub struct RecommendDictionary {
    entries: HashMap<String, String>,
    /// Distinct key lengths in chars.
    lengths: BTreeSet<usize>,
}

impl RecommendDictionary {
    /// Empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn every gold span of `confirmed`, in document order.
    ///
    /// A nesting span registers its inner span first, then its own decoded
    /// surface, so the outer (longer) key is the more recent one.
    #[must_use]
    pub fn from_confirmed(confirmed: &str) -> Self {
        let mut dict = Self::new();
        for span in scan(confirmed, Selector::Gold).spans {
            let surface = span.surface();
            if surface.len() != span.text.len() {
                let inner = decode(&span.text, Selector::Gold);
                for nested in &inner.spans {
                    dict.insert(nested.location.extract(&inner.text), &nested.label);
                }
            }
            dict.insert(&surface, &span.label);
        }
        log::debug!("recommend dictionary: {} entries", dict.len());
        dict
    }

    /// Register `surface` with `label`; later registrations win.
    ///
    /// Whitespace-only surfaces and surfaces that would not survive being
    /// wrapped are ignored. Returns whether the entry was stored.
    pub fn insert(&mut self, surface: &str, label: &str) -> bool {
        if surface.trim().is_empty() {
            return false;
        }
        let wrapped = encode(SpanKind::Suggested, surface, label);
        match parse_one(&wrapped) {
            Some(span) if span.text == surface && span.label == label => {}
            _ => return false,
        }

        self.lengths.insert(surface.chars().count());
        self.entries.insert(surface.to_string(), label.to_string());
        true
    }

    /// Label for an exact surface.
    #[must_use]
    pub fn get(&self, surface: &str) -> Option<&str> {
        self.entries.get(surface).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was learned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest key starting at char `ci` of `text`, as `(byte_end, label)`.
    ///
    /// `boundaries` holds the byte offset of every char plus `text.len()`.
    fn longest_at<'d>(&'d self, text: &str, boundaries: &[usize], ci: usize) -> Option<(usize, &'d str)> {
        let available = boundaries.len() - 1 - ci;
        let start = boundaries[ci];
        self.lengths
            .iter()
            .rev()
            .filter(|&&n| n <= available)
            .find_map(|&n| {
                let end = boundaries[ci + n];
                self.entries
                    .get(&text[start..end])
                    .map(|label| (end, label.as_str()))
            })
    }

    /// Wrap every dictionary hit in a run of plain text.
    fn annotate_plain(&self, text: &str, out: &mut String) -> usize {
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let mut hits = 0;
        let mut ci = 0;
        while ci + 1 < boundaries.len() {
            let at = boundaries[ci];
            let found = self
                .longest_at(text, &boundaries, ci)
                .filter(|(end, _)| !text[*end..].starts_with(LABEL_SEPARATOR));

            match found {
                Some((end, label)) => {
                    out.push_str(&encode(SpanKind::Suggested, &text[at..end], label));
                    hits += 1;
                    while boundaries[ci] < end {
                        ci += 1;
                    }
                }
                None => {
                    out.push_str(&text[at..boundaries[ci + 1]]);
                    ci += 1;
                }
            }
        }
        hits
    }

    /// Insert suggested spans into `pending`.
    ///
    /// Existing suggestions are stripped first; gold spans are copied
    /// through untouched and only the plain text between them is matched.
    #[must_use]
    pub fn annotate(&self, pending: &str) -> String {
        let stripped = strip_suggestions(pending);
        if self.is_empty() {
            return stripped;
        }

        let mut out = String::with_capacity(stripped.len() + stripped.len() / 4);
        let mut last = 0;
        let mut hits = 0;
        for span in scan(&stripped, Selector::Gold).spans {
            hits += self.annotate_plain(&stripped[last..span.location.byte_start], &mut out);
            out.push_str(&stripped[span.location.byte_range()]);
            last = span.location.byte_end;
        }
        hits += self.annotate_plain(&stripped[last..], &mut out);
        log::debug!("recommend: {hits} suggestions");
        out
    }
}

/// Replace every suggested span with its surface text.
#[must_use]
pub fn strip_suggestions(text: &str) -> String {
    decode(text, Selector::Suggested).text
}

/// Join `confirmed` with `pending`, (re)inserting suggestions when enabled.
///
/// With `enabled` false, suggestions in `pending` are stripped. `confirmed`
/// is never modified.
#[must_use]
pub fn merge(confirmed: &str, pending: &str, enabled: bool) -> String {
    let tail = if enabled {
        RecommendDictionary::from_confirmed(confirmed).annotate(pending)
    } else {
        strip_suggestions(pending)
    };
    let mut out = String::with_capacity(confirmed.len() + tail.len());
    out.push_str(confirmed);
    out.push_str(&tail);
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::parser::Selector;
    use proptest::prelude::*;

    const WORDS: &[&str] = &["Obama", "Berlin", "spoke", "in", "New", "York", "the"];

    fn sentence() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(WORDS), 0..12).prop_map(|w| w.join(" "))
    }

    proptest! {
        /// Suggestions never overlap gold spans, and stripping them gives back the input.
        #[test]
        fn recommendation_non_overlap(pending in sentence(), gold_idx in prop::collection::vec(0usize..7, 1..4)) {
            let confirmed: String = gold_idx
                .iter()
                .map(|&i| encode(SpanKind::Gold, WORDS[i], "L"))
                .collect::<Vec<_>>()
                .join(" ")
                + "\n";
            let merged = merge(&confirmed, &pending, true);

            let scanned = scan(&merged, Selector::Any);
            prop_assert!(scanned.issues.is_empty());
            let gold: Vec<_> = scanned.spans.iter().filter(|s| s.kind == SpanKind::Gold).collect();
            for s in scanned.spans.iter().filter(|s| s.kind == SpanKind::Suggested) {
                for g in &gold {
                    prop_assert!(!s.location.intersects(&g.location));
                }
            }
            prop_assert_eq!(strip_suggestions(&merged), format!("{confirmed}{pending}"));
        }
    }
}
