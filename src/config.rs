//! Annotator settings and shortcut schemes.
//!
//! Both are TOML. Settings reject unknown keys; schemes must be a flat
//! table of single-character keys to label strings:
//!
//! ```toml
//! a = "Artificial"
//! p = "Person"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::command::CommandMap;
use crate::export::ExportOptions;
use crate::tagger::{TagScheme, Tokenization};
use crate::{Error, Result};

/// Name of the scheme used when none is configured.
pub const DEFAULT_SCHEME: &str = "default";
/// Extension of scheme files.
pub const SCHEME_EXTENSION: &str = "toml";

/// Annotator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotatorConfig {
    /// Insert suggestions after every edit.
    pub recommend: bool,
    /// Export tag scheme.
    pub tag_scheme: TagScheme,
    /// Export with whitespace tokenization (otherwise one token per char).
    pub segmented: bool,
    /// Collapse labels to `NP` on export.
    pub only_np: bool,
    /// Export suggestions as entities.
    pub keep_recommend: bool,
    /// Write the `.ann` file after every committed edit.
    pub autosave: bool,
    /// Directory holding shortcut schemes.
    pub scheme_dir: PathBuf,
    /// Active scheme.
    pub scheme: String,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            recommend: true,
            tag_scheme: TagScheme::Bmes,
            segmented: true,
            only_np: false,
            keep_recommend: true,
            autosave: true,
            scheme_dir: PathBuf::from("configs"),
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }
}

impl AnnotatorConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Export settings derived from this config.
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            tokenization: if self.segmented {
                Tokenization::Segmented
            } else {
                Tokenization::Unsegmented
            },
            tag_scheme: self.tag_scheme,
            only_np: self.only_np,
            keep_recommend: self.keep_recommend,
        }
    }

    /// Scheme store rooted at `scheme_dir`.
    #[must_use]
    pub fn scheme_store(&self) -> SchemeStore {
        SchemeStore::new(&self.scheme_dir)
    }
}

// =============================================================================
// Shortcut schemes
// =============================================================================

/// Parse a scheme document.
///
/// ```
/// use annotag::config::parse_scheme;
///
/// let map = parse_scheme("p = \"Person\"\nL = \"Location\"").unwrap();
/// assert_eq!(map.get('l'), Some("Location"));
/// assert!(parse_scheme("pp = \"Person\"").is_err());
/// assert!(parse_scheme("p = 3").is_err());
/// ```
pub fn parse_scheme(contents: &str) -> Result<CommandMap> {
    let table: toml::Table = toml::from_str(contents)?;
    let mut map = CommandMap::new();
    for (key, value) in table {
        let mut chars = key.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(Error::config(format!("scheme key {key:?} must be one character"))),
        };
        let label = match value {
            toml::Value::String(label) => label,
            other => {
                return Err(Error::config(format!(
                    "scheme value for {key:?} must be a string, got {}",
                    other.type_str()
                )))
            }
        };
        map.insert(key, label)?;
    }
    Ok(map)
}

/// Render a map as a scheme document.
pub fn scheme_to_toml(map: &CommandMap) -> Result<String> {
    let table: toml::Table = map
        .iter()
        .map(|(k, v)| (k.to_string(), toml::Value::String(v.to_string())))
        .collect();
    Ok(toml::to_string(&table)?)
}

/// A directory of `<name>.toml` schemes.
#[derive(Debug, Clone)]
pub struct SchemeStore {
    dir: PathBuf,
}

impl SchemeStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Scheme directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains(char::is_whitespace)
        {
            return Err(Error::config(format!("invalid scheme name {name:?}")));
        }
        Ok(self.dir.join(format!("{name}.{SCHEME_EXTENSION}")))
    }

    /// Scheme names, sorted; dotfiles are skipped. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCHEME_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load a scheme. The default scheme falls back to the built-in map
    /// when no file exists.
    pub fn load(&self, name: &str) -> Result<CommandMap> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(contents) => parse_scheme(&contents)
                .map_err(|e| Error::config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && name == DEFAULT_SCHEME => {
                Ok(CommandMap::builtin())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::config(format!("no scheme named {name:?} in {}", self.dir.display())))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a scheme, creating the directory if needed.
    pub fn save(&self, name: &str, map: &CommandMap) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, scheme_to_toml(map)?)?;
        log::info!("saved scheme {name:?} ({} keys) to {}", map.len(), path.display());
        Ok(path)
    }
}
