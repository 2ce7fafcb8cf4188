//! Schemes command - list, show, and save shortcut schemes

use clap::{Parser, Subcommand};
use std::fmt::Write as _;

use super::super::output::{color, log_info, write_output};

use crate::command::CommandMap;
use crate::config::{AnnotatorConfig, DEFAULT_SCHEME};

/// Manage shortcut schemes
#[derive(Parser, Debug)]
pub struct SchemesArgs {
    /// Scheme action
    #[command(subcommand)]
    pub action: SchemesAction,
}

/// Scheme actions
#[derive(Subcommand, Debug)]
pub enum SchemesAction {
    /// List schemes in the scheme directory
    List,

    /// Print a scheme's key bindings
    Show {
        /// Scheme name (defaults to the configured scheme)
        name: Option<String>,
    },

    /// Save key bindings as a scheme
    Save {
        /// Scheme name
        name: String,

        /// Bindings as KEY=LABEL
        #[arg(required = true, value_name = "KEY=LABEL")]
        bindings: Vec<String>,

        /// Add to the existing scheme instead of replacing it
        #[arg(long)]
        extend: bool,

        /// Minimal output
        #[arg(short, long)]
        quiet: bool,
    },
}

/// Parse `KEY=LABEL` bindings into `map`.
pub fn apply_bindings(map: &mut CommandMap, bindings: &[String]) -> Result<(), String> {
    for binding in bindings {
        let (key, label) = binding
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=LABEL, got {binding:?}"))?;
        let mut chars = key.trim().chars();
        let key = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(format!("key must be one character, got {key:?}")),
        };
        map.insert(key, label.trim()).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Render a map as aligned `key  label` lines.
pub fn render_map(map: &CommandMap) -> String {
    let mut out = String::new();
    for (key, label) in map.iter() {
        let _ = writeln!(out, "{}  {}", color("1", &key.to_string()), label);
    }
    out
}

/// Run the schemes command
pub fn run(args: SchemesArgs, config: &AnnotatorConfig) -> Result<(), String> {
    let store = config.scheme_store();
    match args.action {
        SchemesAction::List => {
            let mut names = store.list().map_err(|e| e.to_string())?;
            if !names.iter().any(|n| n == DEFAULT_SCHEME) {
                names.insert(0, DEFAULT_SCHEME.to_string());
            }
            let mut out = String::new();
            for name in names {
                let marker = if name == config.scheme { "*" } else { " " };
                let _ = writeln!(out, "{} {}", marker, name);
            }
            write_output(&out, None)
        }
        SchemesAction::Show { name } => {
            let name = name.as_deref().unwrap_or(&config.scheme);
            let map = store.load(name).map_err(|e| e.to_string())?;
            write_output(&render_map(&map), None)
        }
        SchemesAction::Save {
            name,
            bindings,
            extend,
            quiet,
        } => {
            let mut map = if extend {
                store.load(&name).map_err(|e| e.to_string())?
            } else {
                CommandMap::new()
            };
            apply_bindings(&mut map, &bindings)?;
            let path = store.save(&name, &map).map_err(|e| e.to_string())?;
            log_info(&format!("Saved {} keys to {}", map.len(), path.display()), quiet);
            Ok(())
        }
    }
}
