//! Command implementations for annotag CLI
//!
//! Each command has its own module/file with its argument struct and a
//! `run` function.

pub mod export;
pub mod parse;
pub mod recommend;
pub mod run;
pub mod schemes;
pub mod tag;

// Re-export argument types for parser
pub use export::ExportArgs;
pub use parse::ParseArgs;
pub use recommend::RecommendArgs;
pub use run::RunArgs;
pub use schemes::{SchemesAction, SchemesArgs};
pub use tag::TagArgs;
