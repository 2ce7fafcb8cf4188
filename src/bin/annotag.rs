//! annotag - bracketed entity annotation from the command line
//!
//! # Usage
//!
//! ```bash
//! # Chunk structure of an annotated line
//! annotag parse -t "[@Barack Obama#Person*] visited Berlin."
//!
//! # BIO pairs for a document
//! annotag tag --scheme bio -f news.txt.ann
//!
//! # Apply edit instructions, autosaving news.txt.ann
//! annotag run news.txt --script edits.txt
//!
//! # Write news.txt.anns
//! annotag export news.txt.ann
//! ```
//!
//! Library diagnostics go to stderr; set `RUST_LOG=annotag=debug` for more.

use std::process::ExitCode;

use annotag::cli::output::color;
use annotag::cli::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("annotag=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match annotag::cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}
