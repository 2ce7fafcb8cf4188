//! Keystroke and typed-command interpretation.
//!
//! A [`Transaction`] names a target (selection, cursor, or the text after
//! the cursor for typed commands) and a command key. [`execute`] resolves
//! the target, rewrites the span markup, and re-runs recommendation over
//! the part of the document after the edit. The input text is never
//! modified; on error nothing has changed.
//!
//! ```rust
//! use annotag::command::{execute, CommandMap, Target, Transaction};
//! use annotag::CursorPosition;
//!
//! let mut map = CommandMap::new();
//! map.insert('p', "Person").unwrap();
//!
//! let tx = Transaction::Key {
//!     target: Target::Selection {
//!         start: CursorPosition::new(1, 0),
//!         end: CursorPosition::new(1, 12),
//!     },
//!     key: 'p',
//! };
//! let out = execute("Barack Obama was president.", &tx, &map, true).unwrap();
//! assert_eq!(out.text, "[@Barack Obama#Person*] was president.");
//! assert_eq!(out.cursor, CursorPosition::new(1, 23));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::offset::{CursorPosition, SpanConverter};
use crate::parser::{parse_one, scan, scan_nested, Selector};
use crate::recommend::merge;
use crate::span::{encode, encoded_char_len, validate_label, Span, SpanKind};
use crate::{Error, Result};

/// Removes a span's markup.
pub const UNWRAP_KEY: char = 'q';
/// Confirms a suggested span as gold.
pub const CONFIRM_KEY: char = 'y';

// =============================================================================
// Command map
// =============================================================================

/// Single-character key → label.
///
/// Keys are stored as given; lookup falls back to the other case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMap {
    keys: BTreeMap<char, String>,
}

impl CommandMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The map used when no scheme is configured.
    #[must_use]
    pub fn builtin() -> Self {
        let keys = [
            ('a', "Artificial"),
            ('b', "Event"),
            ('c', "Fin-Concept"),
            ('d', "Location"),
            ('e', "Organization"),
            ('f', "Person"),
            ('g', "Sector"),
            ('h', "Other"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();
        Self { keys }
    }

    /// Bind `key` to `label`, replacing any previous binding.
    ///
    /// Keys must be ASCII alphanumeric and not one of the reserved
    /// [`UNWRAP_KEY`] / [`CONFIRM_KEY`] (either case).
    pub fn insert(&mut self, key: char, label: impl Into<String>) -> Result<Option<String>> {
        let label = label.into();
        if !key.is_ascii_alphanumeric() {
            return Err(Error::config(format!("command key {key:?} is not ASCII alphanumeric")));
        }
        if Command::from_key(key) != Command::Label(key) {
            return Err(Error::config(format!("command key {key:?} is reserved")));
        }
        validate_label(&label)?;
        Ok(self.keys.insert(key, label))
    }

    /// Label bound to `key`.
    #[must_use]
    pub fn get(&self, key: char) -> Option<&str> {
        self.keys
            .get(&key)
            .or_else(|| {
                let other = if key.is_ascii_lowercase() {
                    key.to_ascii_uppercase()
                } else {
                    key.to_ascii_lowercase()
                };
                self.keys.get(&other)
            })
            .map(String::as_str)
    }

    /// First key (in key order) bound to `label`.
    #[must_use]
    pub fn key_for_label(&self, label: &str) -> Option<char> {
        self.keys
            .iter()
            .find_map(|(k, v)| (v == label).then_some(*k))
    }

    /// Iterate bindings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.keys.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the map has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// What a key asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Strip the span's markup.
    Unwrap,
    /// Turn the suggestion under the cursor into a gold span.
    Confirm,
    /// Wrap (or relabel) with the label bound to this key.
    Label(char),
}

impl Command {
    /// Interpret a pressed key.
    #[must_use]
    pub fn from_key(key: char) -> Self {
        match key.to_ascii_lowercase() {
            UNWRAP_KEY => Command::Unwrap,
            CONFIRM_KEY => Command::Confirm,
            _ => Command::Label(key),
        }
    }
}

/// What a single-key command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A selected range, `start` inclusive, `end` exclusive.
    Selection {
        /// Selection start.
        start: CursorPosition,
        /// Selection end.
        end: CursorPosition,
    },
    /// The span under the cursor, or the cursor line.
    Cursor(CursorPosition),
}

/// One atomic edit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transaction {
    /// A single key against a selection or cursor.
    Key {
        /// Target.
        target: Target,
        /// Pressed key.
        key: char,
    },
    /// `<count><key>` groups applied to the text following the cursor.
    Typed {
        /// Where the first group starts.
        cursor: CursorPosition,
        /// Command string, e.g. `"3a2b"`. Empty moves to the next line.
        command: String,
    },
}

impl Transaction {
    /// Where the caller's cursor was when the transaction was issued.
    #[must_use]
    pub const fn cursor(&self) -> CursorPosition {
        match self {
            Transaction::Key {
                target: Target::Selection { end, .. },
                ..
            } => *end,
            Transaction::Key {
                target: Target::Cursor(pos),
                ..
            } => *pos,
            Transaction::Typed { cursor, .. } => *cursor,
        }
    }
}

/// Result of a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// New document text.
    pub text: String,
    /// New cursor.
    pub cursor: CursorPosition,
}

// =============================================================================
// Execution
// =============================================================================

static TYPED_COMMAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[0-9]+[A-Za-z])+$").unwrap());
static TYPED_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)([A-Za-z])").unwrap());

/// Split a typed command into `(count, key)` groups.
///
/// ```
/// use annotag::command::parse_typed;
///
/// assert_eq!(parse_typed("3a12b").unwrap(), vec![(3, 'a'), (12, 'b')]);
/// assert!(parse_typed("a3").is_err());
/// ```
pub fn parse_typed(command: &str) -> Result<Vec<(usize, char)>> {
    if !TYPED_COMMAND.is_match(command) {
        return Err(Error::invalid_command(format!(
            "{command:?} is not a sequence of <count><key> groups"
        )));
    }
    TYPED_GROUP
        .captures_iter(command)
        .map(|caps| {
            let count: usize = caps[1]
                .parse()
                .map_err(|e| Error::invalid_command(format!("bad count {:?}: {e}", &caps[1])))?;
            if count == 0 {
                return Err(Error::invalid_command("count must be at least 1"));
            }
            let key = caps[2].chars().next().unwrap_or_default();
            Ok((count, key))
        })
        .collect()
}

/// Run one transaction against `text`.
pub fn execute(
    text: &str,
    transaction: &Transaction,
    map: &CommandMap,
    recommend: bool,
) -> Result<EditOutcome> {
    match transaction {
        Transaction::Key { target, key } => {
            let command = Command::from_key(*key);
            if let Command::Label(k) = command {
                if map.get(k).is_none() {
                    return Err(Error::UnknownCommand(k));
                }
            }
            match *target {
                Target::Selection { start, end } => {
                    let (start, end) = ordered(start.to_char_offset(text)?, end.to_char_offset(text)?);
                    if start == end {
                        execute_cursor(text, start, command, map, recommend)
                    } else {
                        execute_selection(text, start, end, command, map, recommend)
                    }
                }
                Target::Cursor(pos) => {
                    execute_cursor(text, pos.to_char_offset(text)?, command, map, recommend)
                }
            }
        }
        Transaction::Typed { cursor, command } => execute_typed(text, *cursor, command, map, recommend),
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Replace chars `[start, end)` with `content`.
fn splice(text: &str, conv: &SpanConverter, start: usize, end: usize, content: &str) -> String {
    let (bs, be) = (conv.char_to_byte(start), conv.char_to_byte(end));
    let mut out = String::with_capacity(text.len() - (be - bs) + content.len());
    out.push_str(&text[..bs]);
    out.push_str(content);
    out.push_str(&text[be..]);
    out
}

/// Wrap `inner` with `label`, failing if the result would not read back.
fn wrap(inner: &str, label: &str, offset: usize) -> Result<String> {
    let wrapped = encode(SpanKind::Gold, inner, label);
    match parse_one(&wrapped) {
        Some(span) if span.text == inner && span.label == label => Ok(wrapped),
        _ => Err(Error::malformed(offset, format!("{inner:?} cannot be wrapped as a span"))),
    }
}

/// Check that a span now sits at chars `[start, end)` of `text`.
fn verify_in_context(text: &str, start: usize, end: usize) -> Result<()> {
    let found = |s: &Span| s.start() == start && s.end() == end;
    if scan(text, Selector::Any).spans.iter().any(found) || scan_nested(text).iter().any(found) {
        Ok(())
    } else {
        Err(Error::malformed(start, "new span would not parse in its surroundings"))
    }
}

/// Char ranges of every span in `text`, nested ones included.
fn span_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges: Vec<_> = scan(text, Selector::Any)
        .spans
        .iter()
        .map(|s| (s.start(), s.end()))
        .collect();
    ranges.extend(scan_nested(text).iter().map(|s| (s.start(), s.end())));
    ranges
}

/// Check that replacing chars `[start, old_end)` of `before` (now ending at
/// `new_end` in `after`) left every span outside the replaced range intact.
fn verify_untouched(
    before: &str,
    after: &str,
    start: usize,
    old_end: usize,
    new_end: usize,
) -> Result<()> {
    let shift = |pos: usize| if pos >= old_end { pos - old_end + new_end } else { pos };
    let remaining = span_ranges(after);
    for (s, e) in span_ranges(before) {
        if start <= s && e <= old_end {
            continue;
        }
        if !remaining.contains(&(shift(s), shift(e))) {
            return Err(Error::malformed(s, "edit would break an existing span"));
        }
    }
    Ok(())
}

/// Merge at `split` (moved past any span it falls inside) and place the cursor.
fn commit(text: String, split: usize, cursor: usize, recommend: bool) -> EditOutcome {
    let split = scan(&text, Selector::Any)
        .spans
        .iter()
        .find(|s| s.start() < split && split < s.end())
        .map_or(split, Span::end);
    let conv = SpanConverter::new(&text);
    let at = conv.char_to_byte(split);
    let merged = merge(&text[..at], &text[at..], recommend);
    EditOutcome {
        cursor: CursorPosition::from_char_offset(&merged, cursor),
        text: merged,
    }
}

/// Rewrite `inner` per `command`; returns the replacement text.
fn rewrite(inner: &str, command: Command, map: &CommandMap, offset: usize) -> Result<String> {
    match command {
        Command::Unwrap => Ok(inner.to_string()),
        Command::Label(key) => {
            let label = map.get(key).ok_or(Error::UnknownCommand(key))?;
            wrap(inner, label, offset)
        }
        Command::Confirm => Err(Error::invalid_command(
            "confirm applies to a suggestion under the cursor",
        )),
    }
}

fn execute_selection(
    text: &str,
    start: usize,
    end: usize,
    command: Command,
    map: &CommandMap,
    recommend: bool,
) -> Result<EditOutcome> {
    let conv = SpanConverter::new(text);
    let selected = &text[conv.char_to_byte(start)..conv.char_to_byte(end)];
    let inner = match parse_one(selected) {
        Some(span) => span.text,
        None => selected.to_string(),
    };
    log::debug!("selection {start}..{end}: {command:?} on {inner:?}");

    let content = rewrite(&inner, command, map, start)?;
    let new_end = start + content.chars().count();
    let edited = splice(text, &conv, start, end, &content);
    if command != Command::Unwrap {
        verify_in_context(&edited, start, new_end)?;
    }
    verify_untouched(text, &edited, start, end, new_end)?;
    Ok(commit(edited, new_end, new_end, recommend))
}

fn execute_cursor(
    text: &str,
    offset: usize,
    command: Command,
    map: &CommandMap,
    recommend: bool,
) -> Result<EditOutcome> {
    let under_cursor = |selector| {
        scan(text, selector)
            .spans
            .into_iter()
            .find(|s| s.touches(offset))
    };
    let Some(span) = under_cursor(Selector::Gold).or_else(|| under_cursor(Selector::Suggested)) else {
        return Ok(refresh_from(text, offset, recommend));
    };
    log::debug!("{command:?} on {} span {:?} at {}", span.kind, span.text, span.start());

    let content = match command {
        Command::Confirm => {
            let key = map
                .key_for_label(&span.label)
                .ok_or_else(|| Error::UnmappedLabel(span.label.clone()))?;
            rewrite(&span.text, Command::Label(key), map, span.start())?
        }
        other => rewrite(&span.text, other, map, span.start())?,
    };
    let conv = SpanConverter::new(text);
    let new_end = span.start() + content.chars().count();
    let edited = splice(text, &conv, span.start(), span.end(), &content);
    if command != Command::Unwrap {
        verify_in_context(&edited, span.start(), new_end)?;
    }
    verify_untouched(text, &edited, span.start(), span.end(), new_end)?;
    Ok(commit(edited, new_end, new_end, recommend))
}

/// Re-run recommendation after the line holding `cursor`, leaving the
/// text before it and the cursor itself untouched.
pub fn refresh(text: &str, cursor: CursorPosition, recommend: bool) -> Result<EditOutcome> {
    Ok(refresh_from(text, cursor.to_char_offset(text)?, recommend))
}

fn refresh_from(text: &str, offset: usize, recommend: bool) -> EditOutcome {
    let line_end = text
        .chars()
        .enumerate()
        .skip(offset)
        .find_map(|(i, c)| (c == '\n').then_some(i))
        .unwrap_or_else(|| text.chars().count());
    log::debug!("refreshing suggestions from {line_end}");
    commit(text.to_string(), line_end, offset, recommend)
}

fn execute_typed(
    text: &str,
    cursor: CursorPosition,
    command: &str,
    map: &CommandMap,
    recommend: bool,
) -> Result<EditOutcome> {
    let mut offset = cursor.to_char_offset(text)?;
    if command.is_empty() {
        let next = CursorPosition::new(cursor.line + 1, 0);
        let cursor = match next.to_char_offset(text) {
            Ok(_) => next,
            Err(_) => CursorPosition::from_char_offset(text, text.chars().count()),
        };
        return Ok(EditOutcome {
            text: text.to_string(),
            cursor,
        });
    }

    let groups = parse_typed(command)?;
    if let Some(&(_, key)) = groups.iter().find(|(_, key)| map.get(*key).is_none()) {
        return Err(Error::UnknownCommand(key));
    }

    let mut work = text.to_string();
    for (count, key) in groups {
        let label = map.get(key).ok_or(Error::UnknownCommand(key))?;
        let conv = SpanConverter::new(&work);
        let taken: String = work
            .chars()
            .skip(offset)
            .take_while(|c| *c != '\n')
            .take(count)
            .collect();
        let taken_chars = taken.chars().count();
        if taken_chars == 0 {
            return Err(Error::invalid_command(format!(
                "nothing left to select at {}",
                CursorPosition::from_char_offset(&work, offset)
            )));
        }
        log::debug!("typed {count}{key}: wrapping {taken:?} at {offset}");

        let wrapped = wrap(&taken, label, offset)?;
        let edited = splice(&work, &conv, offset, offset + taken_chars, &wrapped);
        let end = offset + encoded_char_len(taken_chars, label);
        verify_in_context(&edited, offset, end)?;
        verify_untouched(&work, &edited, offset, offset + taken_chars, end)?;
        work = edited;
        offset = end;
    }
    Ok(commit(work, offset, offset, recommend))
}
