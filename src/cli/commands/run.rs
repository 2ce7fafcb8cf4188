//! Run command - drive an editing session from a script
//!
//! One instruction per line; `#` starts a comment.
//!
//! ```text
//! select 1:0 1:12 p     wrap/relabel/unwrap the selection with key p
//! key 1:5 q             key at a cursor position
//! type 1:0 5p2l         typed <count><key> groups from a cursor position
//! type 1:0              empty typed command: move to the next line
//! cursor 2:0            move the cursor
//! undo
//! recommend on|off
//! scheme NAME
//! export
//! print
//! ```

use clap::Parser;
use std::io::{self, Read};

use super::super::output::{color, log_info, write_output};

use crate::command::{Target, Transaction};
use crate::config::AnnotatorConfig;
use crate::offset::CursorPosition;
use crate::session::Session;

/// Apply a script of edit commands to a file
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Document to edit (.txt or .ann)
    #[arg(value_name = "PATH")]
    pub file: String,

    /// Script file (stdin when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub script: Option<String>,

    /// Do not write the .ann file
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first failing instruction
    #[arg(long)]
    pub strict: bool,

    /// Do not print the final document
    #[arg(short, long)]
    pub quiet: bool,
}

/// One script instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Run a transaction.
    Edit(Transaction),
    /// Move the cursor.
    Cursor(CursorPosition),
    /// Undo the last edit.
    Undo,
    /// Toggle recommendation.
    Recommend(bool),
    /// Switch shortcut scheme.
    Scheme(String),
    /// Export with the configured settings.
    Export,
    /// Print the document.
    Print,
}

fn parse_pos(s: Option<&str>) -> Result<CursorPosition, String> {
    s.ok_or_else(|| "missing LINE:COLUMN".to_string())?
        .parse()
        .map_err(|e: crate::Error| e.to_string())
}

fn parse_key(s: Option<&str>) -> Result<char, String> {
    let s = s.ok_or_else(|| "missing key".to_string())?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("key must be one character, got {s:?}")),
    }
}

/// Parse one script line; blank lines and comments yield `None`.
pub fn parse_instruction(line: &str) -> Result<Option<Instruction>, String> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let instruction = match verb {
        "select" => {
            let start = parse_pos(words.next())?;
            let end = parse_pos(words.next())?;
            let key = parse_key(words.next())?;
            Instruction::Edit(Transaction::Key {
                target: Target::Selection { start, end },
                key,
            })
        }
        "key" => {
            let pos = parse_pos(words.next())?;
            let key = parse_key(words.next())?;
            Instruction::Edit(Transaction::Key {
                target: Target::Cursor(pos),
                key,
            })
        }
        "type" => {
            let cursor = parse_pos(words.next())?;
            let command = words.next().unwrap_or_default().to_string();
            Instruction::Edit(Transaction::Typed { cursor, command })
        }
        "cursor" => Instruction::Cursor(parse_pos(words.next())?),
        "undo" => Instruction::Undo,
        "recommend" => match words.next() {
            Some("on") => Instruction::Recommend(true),
            Some("off") => Instruction::Recommend(false),
            other => return Err(format!("recommend expects on|off, got {other:?}")),
        },
        "scheme" => Instruction::Scheme(
            words
                .next()
                .ok_or_else(|| "missing scheme name".to_string())?
                .to_string(),
        ),
        "export" => Instruction::Export,
        "print" => Instruction::Print,
        other => return Err(format!("unknown instruction {other:?}")),
    };
    if let Some(extra) = words.next() {
        return Err(format!("unexpected {extra:?} after {verb}"));
    }
    Ok(Some(instruction))
}

fn apply(session: &mut Session, instruction: Instruction) -> Result<(), String> {
    let err = |e: crate::Error| e.to_string();
    match instruction {
        Instruction::Edit(tx) => session.mutate(&tx).map(|_| ()).map_err(err),
        Instruction::Cursor(pos) => session.set_cursor(pos).map_err(err),
        Instruction::Undo => session.undo().map(|_| ()).map_err(err),
        Instruction::Recommend(on) => session.toggle_recommend(on).map(|_| ()).map_err(err),
        Instruction::Scheme(name) => session.load_scheme(&name).map_err(err),
        Instruction::Export => {
            let summary = session.export().map_err(err)?;
            eprintln!("{}", summary);
            Ok(())
        }
        Instruction::Print => {
            println!("{}", session.text());
            Ok(())
        }
    }
}

/// Run the run command
pub fn run(args: RunArgs, mut config: AnnotatorConfig) -> Result<(), String> {
    if args.dry_run {
        config.autosave = false;
    }
    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script {}: {}", path, e))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read from stdin: {}", e))?;
            buffer
        }
    };

    let mut session = Session::open(&args.file, config).map_err(|e| e.to_string())?;
    let mut failures = 0;
    for (idx, line) in script.lines().enumerate() {
        let result = parse_instruction(line)
            .and_then(|parsed| parsed.map_or(Ok(()), |i| apply(&mut session, i)));
        if let Err(e) = result {
            failures += 1;
            let msg = format!("{} line {}: {}", color("31", "error:"), idx + 1, e);
            if args.strict {
                return Err(format!("line {}: {}", idx + 1, e));
            }
            eprintln!("{}", msg);
        }
    }

    if let Some(path) = session.path() {
        log_info(&format!("Document: {}", path.display()), args.quiet);
    }
    if !args.quiet {
        write_output(session.text(), None)?;
        if !session.text().ends_with('\n') {
            println!();
        }
    }
    if failures > 0 {
        return Err(format!("{} instruction(s) failed", failures));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instructions() {
        assert_eq!(parse_instruction("  # note").unwrap(), None);
        assert_eq!(parse_instruction("").unwrap(), None);
        assert_eq!(
            parse_instruction("select 1:0 1:5 p").unwrap(),
            Some(Instruction::Edit(Transaction::Key {
                target: Target::Selection {
                    start: CursorPosition::new(1, 0),
                    end: CursorPosition::new(1, 5),
                },
                key: 'p',
            }))
        );
        assert_eq!(
            parse_instruction("type 2:3").unwrap(),
            Some(Instruction::Edit(Transaction::Typed {
                cursor: CursorPosition::new(2, 3),
                command: String::new(),
            }))
        );
        assert_eq!(parse_instruction("recommend off").unwrap(), Some(Instruction::Recommend(false)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_instruction("select 1:0 p").is_err());
        assert!(parse_instruction("key 0:0 p").is_err());
        assert!(parse_instruction("key 1:0 pp").is_err());
        assert!(parse_instruction("undo now").is_err());
        assert!(parse_instruction("jump").is_err());
    }
}
