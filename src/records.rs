//! Named record storage
//!
//! Records are envelopes saved under a user-chosen name. They live in a single
//! JSON object on disk, keyed `record.<name>`. Keys without that prefix are
//! carried through untouched.

use crate::envelope;
use crate::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use crate::output;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const RECORD_PREFIX: &str = "record.";

/// File-backed store of named envelopes.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl RecordStore {
    /// Load the store at `path`, or start an empty one if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                TextsafeError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Store,
                    format!("record store {} is corrupt", path.display()),
                    e,
                )
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no record store at {}, starting empty", path.display());
                Map::new()
            }
            Err(e) => {
                return Err(TextsafeError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to read from {}", path.display()),
                    e,
                ));
            }
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save `envelope` under `name`, replacing any record of the same name.
    pub fn put(&mut self, name: &str, envelope: &str) -> Result<()> {
        check_name(name)?;
        if !envelope::is_envelope(envelope) {
            return Err(TextsafeError::user(
                ErrorKind::NotEncrypted,
                "You can only store encrypted data",
            ));
        }

        let replaced = self
            .entries
            .insert(key(name), Value::String(envelope.trim().to_owned()))
            .is_some();
        log::debug!("stored record {:?} (replaced: {})", name, replaced);
        self.persist()
    }

    /// Fetch the envelope stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&key(name)).and_then(Value::as_str)
    }

    /// Remove the record called `name`. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        check_name(name)?;
        if self.entries.remove(&key(name)).is_none() {
            return Ok(false);
        }
        log::debug!("removed record {:?}", name);
        self.persist()?;
        Ok(true)
    }

    /// Record names in ascending order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter_map(|(k, v)| {
                let name = k.strip_prefix(RECORD_PREFIX)?;
                if v.is_string() {
                    Some(name)
                } else {
                    log::warn!("ignoring non-text record {:?}", name);
                    None
                }
            })
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self) -> Result<()> {
        let contents = serde_json::to_vec_pretty(&self.entries).map_err(|e| {
            TextsafeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "failed to serialize records",
                e,
            )
        })?;
        output::write_atomic(&self.path, &contents)
            .map_err(|e| e.with_context(format!("failed to save records to {}", self.path.display())))
    }
}

fn key(name: &str) -> String {
    format!("{}{}", RECORD_PREFIX, name)
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TextsafeError::user(
            ErrorKind::InvalidInput,
            "record name must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn fake_envelope(body: &[u8]) -> String {
        envelope::wrap(body)
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path().join("records.json")).unwrap();
        assert!(store.is_empty());
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_put_get_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");

        let mut store = RecordStore::open(&path).unwrap();
        store.put("bank", &fake_envelope(b"one")).unwrap();

        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.get("bank"), Some(fake_envelope(b"one").as_str()));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_same_name_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = RecordStore::open(temp_dir.path().join("records.json")).unwrap();

        store.put("bank", &fake_envelope(b"old")).unwrap();
        store.put("bank", &fake_envelope(b"new")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("bank"), Some(fake_envelope(b"new").as_str()));
    }

    #[test]
    fn test_only_envelopes_can_be_stored() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = RecordStore::open(temp_dir.path().join("records.json")).unwrap();

        let err = store.put("plain", "hello").expect_err("expected rejection");
        assert_eq!(err.kind, Some(ErrorKind::NotEncrypted));
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = RecordStore::open(temp_dir.path().join("records.json")).unwrap();

        let err = store.put("  ", &fake_envelope(b"x")).expect_err("expected rejection");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_names_sorted_and_foreign_keys_kept() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        fs::write(&path, r#"{"try-to-paste": true, "record.zeta": "data:application/octet-binary;base64,AA=="}"#)
            .unwrap();

        let mut store = RecordStore::open(&path).unwrap();
        store.put("alpha", &fake_envelope(b"a")).unwrap();
        store.put("mid", &fake_envelope(b"m")).unwrap();
        assert_eq!(store.names(), vec!["alpha", "mid", "zeta"]);

        let raw: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["try-to-paste"], Value::Bool(true));
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");

        let mut store = RecordStore::open(&path).unwrap();
        store.put("bank", &fake_envelope(b"one")).unwrap();
        assert!(store.remove("bank").unwrap());
        assert!(!store.remove("bank").unwrap());

        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.get("bank"), None);
    }

    #[test]
    fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        fs::write(&path, b"not json").unwrap();

        let err = RecordStore::open(&path).expect_err("expected corrupt store error");
        assert_eq!(err.kind, Some(ErrorKind::Store));
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("records.json");

        let mut store = RecordStore::open(&path).unwrap();
        store.put("bank", &fake_envelope(b"one")).unwrap();
        assert!(path.exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");

        let mut store = RecordStore::open(&path).unwrap();
        store.put("bank", &fake_envelope(b"one")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
