//! Parse command - chunk structure of annotated text

use clap::Parser;
use std::fmt::Write as _;

use super::super::output::{color, write_output};
use super::super::parser::{OutputFormat, SpanSelector};
use super::super::utils::get_input_text;

use crate::parser::{chunks, scan_nested, Chunked};

/// Show the chunk structure of annotated text
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Input text to process
    #[arg(short, long)]
    pub text: Option<String>,

    /// Read input from file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<String>,

    /// Span kinds to recognize
    #[arg(long, default_value = "any")]
    pub select: SpanSelector,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Positional text argument
    #[arg(trailing_var_arg = true)]
    pub positional: Vec<String>,
}

fn escape_tsv(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn render_human(text: &str, chunked: &Chunked) -> String {
    let mut out = String::new();
    for chunk in &chunked.chunks {
        let range = format!("{:>5}..{:<5}", chunk.start(), chunk.end());
        match (&chunk.label, chunk.kind) {
            (Some(label), Some(kind)) => {
                let code = if kind == crate::SpanKind::Gold { "32" } else { "36" };
                let _ = writeln!(
                    out,
                    "{} {} {:?}",
                    range,
                    color(code, &format!("{label} ({kind})")),
                    chunk.content
                );
            }
            _ => {
                let _ = writeln!(out, "{} {} {:?}", range, color("2", "-"), chunk.content);
            }
        }
    }
    for nested in scan_nested(text) {
        let _ = writeln!(
            out,
            "{:>5}..{:<5} {} {:?}",
            nested.start(),
            nested.end(),
            color("33", &format!("nested {}", nested.label)),
            nested.text
        );
    }
    for issue in &chunked.issues {
        let _ = writeln!(out, "{} {}", color("33", "warning:"), issue);
    }
    out
}

fn render_tsv(chunked: &Chunked) -> String {
    let mut out = String::from("start\tend\tkind\tlabel\tcontent\n");
    for chunk in &chunked.chunks {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            chunk.start(),
            chunk.end(),
            chunk.kind.map(|k| k.to_string()).unwrap_or_default(),
            chunk.label.as_deref().unwrap_or(""),
            escape_tsv(&chunk.content)
        );
    }
    out
}

/// Render the chunk structure of `text` in `format`.
pub fn render(text: &str, args: &ParseArgs) -> Result<String, String> {
    let chunked = chunks(text, args.select.into());
    match args.format {
        OutputFormat::Human => Ok(render_human(text, &chunked)),
        OutputFormat::Json => serde_json::to_string_pretty(&chunked)
            .map(|s| s + "\n")
            .map_err(|e| format!("Failed to serialize chunks: {}", e)),
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for chunk in &chunked.chunks {
                let line = serde_json::to_string(chunk)
                    .map_err(|e| format!("Failed to serialize chunk: {}", e))?;
                out.push_str(&line);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Tsv => Ok(render_tsv(&chunked)),
    }
}

/// Run the parse command
pub fn run(args: ParseArgs) -> Result<(), String> {
    let text = get_input_text(&args.text, args.file.as_deref(), &args.positional)?;
    let rendered = render(&text, &args)?;
    write_output(&rendered, args.output.as_deref())
}
