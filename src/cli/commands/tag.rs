//! Tag command - token/tag pairs for annotated text

use clap::{Args, Parser};

use super::super::output::write_output;
use super::super::parser::SchemeArg;
use super::super::utils::get_input_text;

use crate::config::AnnotatorConfig;
use crate::export::{export_text, ExportOptions};
use crate::tagger::Tokenization;

/// Print token/tag pairs for annotated text
#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Input text to process
    #[arg(short, long)]
    pub text: Option<String>,

    /// Read input from file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<String>,

    #[command(flatten)]
    pub flags: TagFlags,

    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Positional text argument
    #[arg(trailing_var_arg = true)]
    pub positional: Vec<String>,
}

/// Tagging flags shared by `tag` and `export`
#[derive(Args, Debug, Clone, Default)]
pub struct TagFlags {
    /// Tag scheme (defaults to the configured one)
    #[arg(long, value_enum)]
    pub scheme: Option<SchemeArg>,

    /// One token per character instead of whitespace splitting
    #[arg(long)]
    pub unsegmented: bool,

    /// Collapse every label to NP
    #[arg(long)]
    pub only_np: bool,

    /// Treat suggested spans as plain text
    #[arg(long)]
    pub drop_suggestions: bool,
}

impl TagFlags {
    /// Export options: config values overridden by flags.
    pub fn options(&self, config: &AnnotatorConfig) -> ExportOptions {
        let mut options = config.export_options();
        if let Some(scheme) = self.scheme {
            options.tag_scheme = scheme.into();
        }
        if self.unsegmented {
            options.tokenization = Tokenization::Unsegmented;
        }
        options.only_np |= self.only_np;
        options.keep_recommend &= !self.drop_suggestions;
        options
    }
}

/// Run the tag command
pub fn run(args: TagArgs, config: &AnnotatorConfig) -> Result<(), String> {
    let text = get_input_text(&args.text, args.file.as_deref(), &args.positional)?;
    let out = export_text(&text, &args.flags.options(config));
    write_output(&out, args.output.as_deref())
}
