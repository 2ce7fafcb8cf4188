//! Recommend command - suggest spans from another document's gold spans

use clap::Parser;

use super::super::output::{log_info, write_output};
use super::super::utils::{get_input_text, read_input_file};

use crate::recommend::{strip_suggestions, RecommendDictionary};

/// Suggest spans using the gold spans of another document
#[derive(Parser, Debug)]
pub struct RecommendArgs {
    /// Annotated document to learn the dictionary from
    #[arg(long, value_name = "PATH", required_unless_present = "strip")]
    pub from: Option<String>,

    /// Input text to annotate
    #[arg(short, long)]
    pub text: Option<String>,

    /// Read input from file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<String>,

    /// Only remove existing suggestions
    #[arg(long)]
    pub strip: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Positional text argument
    #[arg(trailing_var_arg = true)]
    pub positional: Vec<String>,
}

/// Run the recommend command
pub fn run(args: RecommendArgs) -> Result<(), String> {
    let text = get_input_text(&args.text, args.file.as_deref(), &args.positional)?;
    let out = match (&args.from, args.strip) {
        (_, true) => strip_suggestions(&text),
        (Some(from), false) => {
            let dict = RecommendDictionary::from_confirmed(&read_input_file(from)?);
            log_info(&format!("Dictionary: {} entries from {}", dict.len(), from), args.quiet);
            dict.annotate(&text)
        }
        (None, false) => return Err("--from is required unless --strip is given".to_string()),
    };
    write_output(&out, args.output.as_deref())
}
