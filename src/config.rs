//! Configuration file handling
//!
//! The file is optional TOML. Every key has a default.

use crate::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "textsafe";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Location of the record store.
    pub store: PathBuf,
    /// Ask for the passphrase twice before encrypting from a terminal.
    pub confirm_passphrase: bool,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: default_store_path(),
            confirm_passphrase: true,
            log_level: "warn".to_owned(),
        }
    }
}

impl Config {
    /// Load the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(TextsafeError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to read config {}", path.display()),
                    e,
                ));
            }
        };
        Self::parse(&contents)
            .map_err(|e| e.with_context(format!("failed to parse config {}", path.display())))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| {
            TextsafeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Config,
                format!("invalid config: {}", e.message()),
                e,
            )
        })
    }
}

/// `<config dir>/textsafe/config.toml`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_default()
        .join("config.toml")
}

/// `<data dir>/textsafe/records.json`, falling back to the working directory.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_default()
        .join("records.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.confirm_passphrase);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::parse("confirm_passphrase = false\n").unwrap();
        assert!(!config.confirm_passphrase);
        assert_eq!(config.store, default_store_path());
    }

    #[test]
    fn test_full_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "store = \"/tmp/records.json\"\nconfirm_passphrase = true\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store, PathBuf::from("/tmp/records.json"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::parse("colour = \"blue\"\n").expect_err("expected config error");
        assert_eq!(err.kind, Some(ErrorKind::Config));
    }

    #[test]
    fn test_bad_type_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "confirm_passphrase = \"yes\"\n").unwrap();

        let err = Config::load(&path).expect_err("expected config error");
        assert_eq!(err.kind, Some(ErrorKind::Config));
    }

    #[test]
    fn test_default_paths_end_with_file_names() {
        assert!(default_config_path().ends_with("config.toml"));
        assert!(default_store_path().ends_with("records.json"));
    }
}
