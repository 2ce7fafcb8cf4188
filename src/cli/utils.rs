//! Utility functions for CLI commands

use std::io::{self, Read};
use std::path::Path;

use crate::config::AnnotatorConfig;
use crate::document::read_document;

/// Get input text from various sources (text arg, file, or stdin)
pub fn get_input_text(
    text: &Option<String>,
    file: Option<&str>,
    positional: &[String],
) -> Result<String, String> {
    if let Some(t) = text {
        Ok(t.clone())
    } else if let Some(f) = file {
        read_input_file(f)
    } else if !positional.is_empty() {
        Ok(positional.join(" "))
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        Ok(buffer)
    }
}

/// Read an annotation file with encoding detection
pub fn read_input_file(path: &str) -> Result<String, String> {
    read_document(Path::new(path))
        .map(|(text, _)| text)
        .map_err(|e| format!("Failed to read file {}: {}", path, e))
}

/// Load settings, falling back to defaults when the file is absent
pub fn load_config(path: &str) -> Result<AnnotatorConfig, String> {
    AnnotatorConfig::load(Path::new(path)).map_err(|e| format!("Failed to load {}: {}", path, e))
}
