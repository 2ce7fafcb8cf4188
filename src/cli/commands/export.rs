//! Export command - write the .anns sequence file next to an annotation file

use clap::Parser;
use std::path::Path;

use super::super::output::log_info;
use super::tag::TagFlags;

use crate::config::AnnotatorConfig;
use crate::export::export_file;

/// Export an .ann or .txt file to .anns
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// File to export (must end in .ann or .txt)
    #[arg(value_name = "PATH")]
    pub file: String,

    #[command(flatten)]
    pub flags: TagFlags,

    /// Print the output path only
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the export command
pub fn run(args: ExportArgs, config: &AnnotatorConfig) -> Result<(), String> {
    let options = args.flags.options(config);
    let summary = export_file(Path::new(&args.file), &options).map_err(|e| e.to_string())?;
    log_info(&summary.to_string(), args.quiet);
    println!("{}", summary.path.display());
    Ok(())
}
