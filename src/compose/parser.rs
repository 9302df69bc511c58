//! Docker Compose file parser

use super::config::ComposeConfig;
use crate::error::{ConvertError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default compose file names
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Find compose file in directory
    pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
        DEFAULT_COMPOSE_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Read compose file text from a path, `-` meaning stdin
    pub fn read_source(path: &Path) -> Result<String> {
        if path == Path::new("-") {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            return Ok(content);
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse compose file from string
    ///
    /// Only YAML syntax errors fail here. An empty document or a document
    /// without `services` parses fine; the converter decides what to do
    /// with it.
    pub fn parse_str(content: &str) -> Result<ComposeConfig> {
        if content.trim().is_empty() {
            return Ok(ComposeConfig::default());
        }
        let doc: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConvertError::Parse(e.to_string()))?;
        Ok(ComposeConfig::from_value(&doc))
    }
}
