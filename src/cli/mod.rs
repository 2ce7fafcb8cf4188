//! CLI library modules for the annotag binary.
//!
//! The binary is a thin headless shell over [`crate::Session`]; the command
//! implementations live here so they can be tested without spawning it.

pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;

pub use parser::{Cli, Commands};

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<(), String> {
    use clap::CommandFactory;
    use clap_complete::generate;

    let config = utils::load_config(&cli.config)?;
    match cli.command {
        Commands::Parse(args) => commands::parse::run(args),
        Commands::Tag(args) => commands::tag::run(args, &config),
        Commands::Export(args) => commands::export::run(args, &config),
        Commands::Recommend(args) => commands::recommend::run(args),
        Commands::Run(args) => commands::run::run(args, config),
        Commands::Schemes(args) => commands::schemes::run(args, &config),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "annotag", &mut std::io::stdout());
            Ok(())
        }
    }
}
