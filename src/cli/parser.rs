//! CLI argument parsing and structure definitions

use clap::{Parser, Subcommand, ValueEnum};

use super::commands;
use crate::parser::Selector;
use crate::tagger::TagScheme;

/// Bracketed entity annotation toolkit
#[derive(Parser)]
#[command(name = "annotag")]
#[command(
    author,
    version,
    about = "Bracketed entity annotation: parse, suggest, edit, export",
    long_about = r#"
annotag - entity span annotation from the command line

FORMAT:
  gold       [@Barack Obama#Person*]
  suggested  [$Barack Obama#Person*]

EXAMPLES:
  annotag parse -t "[@Barack Obama#Person*] was president."
  annotag tag --scheme bio -f news.txt.ann
  annotag recommend --from done.ann -f todo.txt
  annotag run news.txt --script edits.txt
  annotag export news.txt.ann
  annotag schemes list
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file
    #[arg(long, global = true, value_name = "PATH", default_value = "annotag.toml")]
    pub config: String,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the chunk structure of annotated text
    #[command(visible_alias = "p")]
    Parse(commands::ParseArgs),

    /// Print token/tag pairs for annotated text
    #[command(visible_alias = "t")]
    Tag(commands::TagArgs),

    /// Export an .ann or .txt file to .anns
    #[command(visible_alias = "x")]
    Export(commands::ExportArgs),

    /// Suggest spans using the gold spans of another document
    #[command(visible_alias = "r")]
    Recommend(commands::RecommendArgs),

    /// Apply a script of edit commands to a file
    Run(commands::RunArgs),

    /// Manage shortcut schemes
    Schemes(commands::SchemesArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Output format for `parse`
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output (default)
    #[default]
    Human,
    /// Pretty JSON document
    Json,
    /// One JSON chunk per line
    Jsonl,
    /// Tab-separated values
    Tsv,
}

/// Which span kinds to recognize
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SpanSelector {
    /// Gold spans only
    Gold,
    /// Suggested spans only
    Suggested,
    /// Both
    #[default]
    Any,
}

impl From<SpanSelector> for Selector {
    fn from(s: SpanSelector) -> Self {
        match s {
            SpanSelector::Gold => Selector::Gold,
            SpanSelector::Suggested => Selector::Suggested,
            SpanSelector::Any => Selector::Any,
        }
    }
}

/// Tag scheme
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemeArg {
    /// Begin/Middle/End/Single
    Bmes,
    /// Begin/Inside
    Bio,
}

impl From<SchemeArg> for TagScheme {
    fn from(s: SchemeArg) -> Self {
        match s {
            SchemeArg::Bmes => TagScheme::Bmes,
            SchemeArg::Bio => TagScheme::Bio,
        }
    }
}
