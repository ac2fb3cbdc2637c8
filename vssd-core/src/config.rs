//! Interpreter session configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default prompt printed before each interactive command
pub const DEFAULT_PROMPT: &str = "cmd: ";

/// Error type for loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The document is not a valid config
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How `read` shows a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    /// Raw bytes, no conversion
    #[default]
    Raw,
    /// Offset, hex bytes and printable ASCII
    Hex,
}

/// Settings for a [`crate::protocol::Session`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Prompt printed before each command in interactive mode
    pub prompt: String,
    /// Print the command summary when an interactive session starts
    pub show_banner: bool,
    /// How blocks are shown by `read`
    pub dump_format: DumpFormat,
    /// End the session at the first unrecognized command
    pub stop_on_unknown_command: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            show_banner: true,
            dump_format: DumpFormat::Raw,
            stop_on_unknown_command: false,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&contents)?;
        log::debug!("Loaded session config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = SessionConfig::from_json(r#"{ "dump_format": "hex" }"#).unwrap();
        assert_eq!(config.dump_format, DumpFormat::Hex);
        assert_eq!(config.prompt, DEFAULT_PROMPT);
        assert!(config.show_banner);
        assert!(!config.stop_on_unknown_command);
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = SessionConfig {
            prompt: "> ".to_string(),
            show_banner: false,
            dump_format: DumpFormat::Raw,
            stop_on_unknown_command: true,
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(SessionConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            SessionConfig::load(&missing),
            Err(crate::Error::Config(ConfigError::Io { .. }))
        ));

        let bad = temp_dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            SessionConfig::load(&bad),
            Err(crate::Error::Config(ConfigError::Parse(_)))
        ));
    }
}
