//! User-facing actions and their handlers
//!
//! Actions have string ids such as `encrypt-replace` or `record.<name>`,
//! which parse through `FromStr`. Dispatch happens on the enum.

use crate::cipher;
use crate::envelope;
use crate::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use crate::passphrase::PassphraseReader;
use crate::records::RecordStore;
use std::fmt;
use std::str::FromStr;

/// Where an action's resulting text should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// Hand the text back to the caller (`*-clipboard` ids).
    Stdout,
    /// Overwrite the input with the text (`*-replace` ids).
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Encrypt(Sink),
    Decrypt(Sink),
    EncryptStore { name: String },
    OpenRecord { name: String },
    RemoveRecord { name: String },
    ListRecords,
}

/// Result of a successful action.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Text produced by the action, if any.
    pub text: Option<String>,
    /// Short human-readable notice about what happened.
    pub notice: Option<String>,
}

impl Action {
    pub fn sink(&self) -> Sink {
        match self {
            Action::Encrypt(sink) | Action::Decrypt(sink) => *sink,
            _ => Sink::Stdout,
        }
    }

    /// Whether the action operates on caller-supplied text.
    pub fn needs_input(&self) -> bool {
        matches!(
            self,
            Action::Encrypt(_) | Action::Decrypt(_) | Action::EncryptStore { .. }
        )
    }

    pub fn needs_passphrase(&self) -> bool {
        matches!(
            self,
            Action::Encrypt(_)
                | Action::Decrypt(_)
                | Action::EncryptStore { .. }
                | Action::OpenRecord { .. }
        )
    }

    pub fn needs_store(&self) -> bool {
        matches!(
            self,
            Action::EncryptStore { .. }
                | Action::OpenRecord { .. }
                | Action::RemoveRecord { .. }
                | Action::ListRecords
        )
    }

    /// Whether the passphrase should be entered twice.
    pub fn is_encryption(&self) -> bool {
        matches!(self, Action::Encrypt(_) | Action::EncryptStore { .. })
    }
}

impl FromStr for Action {
    type Err = TextsafeError;

    fn from_str(id: &str) -> Result<Self> {
        let action = match id {
            "encrypt-clipboard" => Action::Encrypt(Sink::Stdout),
            "encrypt-replace" => Action::Encrypt(Sink::Replace),
            "decrypt-clipboard" => Action::Decrypt(Sink::Stdout),
            "decrypt-replace" => Action::Decrypt(Sink::Replace),
            "records" => Action::ListRecords,
            _ => match id.strip_prefix("record.") {
                Some(name) if !name.is_empty() => Action::OpenRecord {
                    name: name.to_owned(),
                },
                _ => {
                    return Err(TextsafeError::user(
                        ErrorKind::InvalidInput,
                        format!("unknown action {:?}", id),
                    ));
                }
            },
        };
        Ok(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Encrypt(Sink::Stdout) => f.write_str("encrypt-clipboard"),
            Action::Encrypt(Sink::Replace) => f.write_str("encrypt-replace"),
            Action::Decrypt(Sink::Stdout) => f.write_str("decrypt-clipboard"),
            Action::Decrypt(Sink::Replace) => f.write_str("decrypt-replace"),
            Action::EncryptStore { .. } => f.write_str("encrypt-store"),
            Action::OpenRecord { name } => write!(f, "record.{}", name),
            Action::RemoveRecord { .. } => f.write_str("remove"),
            Action::ListRecords => f.write_str("records"),
        }
    }
}

/// Run `action` against `input`.
///
/// `store` must be provided for actions where [`Action::needs_store`] is true.
/// The passphrase reader is only consulted once the input passed its checks.
pub fn execute(
    action: &Action,
    input: &str,
    passphrases: &mut dyn PassphraseReader,
    store: Option<&mut RecordStore>,
) -> Result<Outcome> {
    log::debug!("running action {}", action);

    match action {
        Action::Encrypt(sink) => {
            let encrypted = encrypt_selection(input, passphrases)?;
            Ok(Outcome {
                text: Some(encrypted),
                notice: Some(delivered("Encrypted", *sink)),
            })
        }
        Action::EncryptStore { name } => {
            let store = require_store(store)?;
            let encrypted = encrypt_selection(input, passphrases)?;
            store.put(name, &encrypted)?;
            Ok(Outcome {
                text: None,
                notice: Some(format!(
                    "Saved the encrypted data as record {:?} in your record store ({})",
                    name,
                    store.path().display()
                )),
            })
        }
        Action::Decrypt(sink) => {
            let decrypted = decrypt_selection(input, passphrases)?;
            Ok(Outcome {
                text: Some(decrypted),
                notice: Some(delivered("Decrypted", *sink)),
            })
        }
        Action::OpenRecord { name } => {
            let store = require_store(store)?;
            let stored = store.get(name).ok_or_else(|| missing_record(name))?;
            let decrypted = decrypt_selection(stored, passphrases)?;
            Ok(Outcome {
                text: Some(decrypted),
                notice: Some(delivered("Decrypted", Sink::Stdout)),
            })
        }
        Action::RemoveRecord { name } => {
            let store = require_store(store)?;
            if !store.remove(name)? {
                return Err(missing_record(name));
            }
            Ok(Outcome {
                text: None,
                notice: Some(format!("Removed record {:?}", name)),
            })
        }
        Action::ListRecords => {
            let store = require_store(store)?;
            let names = store.names();
            if names.is_empty() {
                return Ok(Outcome {
                    text: None,
                    notice: Some("No records stored yet".to_owned()),
                });
            }
            let mut listing = names.join("\n");
            listing.push('\n');
            Ok(Outcome {
                text: Some(listing),
                notice: None,
            })
        }
    }
}

/// Notice for text handed to `sink`, e.g. "Encrypted text is copied to the output".
fn delivered(what: &str, sink: Sink) -> String {
    match sink {
        Sink::Stdout => format!("{} text is copied to the output", what),
        Sink::Replace => format!("{} text replaced the input", what),
    }
}

fn encrypt_selection(input: &str, passphrases: &mut dyn PassphraseReader) -> Result<String> {
    if input.is_empty() {
        return Err(TextsafeError::user(ErrorKind::EmptySelection, "Selection is empty"));
    }
    if envelope::is_envelope(input) {
        return Err(TextsafeError::user(
            ErrorKind::AlreadyEncrypted,
            "Selected text is already encrypted",
        ));
    }

    let passphrase = passphrases.read_passphrase()?;
    if passphrase.is_empty() {
        return Err(TextsafeError::user(
            ErrorKind::InvalidInput,
            "Empty passphrase. Operation terminated",
        ));
    }
    cipher::encrypt(input, &passphrase)
}

fn decrypt_selection(input: &str, passphrases: &mut dyn PassphraseReader) -> Result<String> {
    if input.trim().is_empty() {
        return Err(TextsafeError::user(ErrorKind::EmptySelection, "Selection is empty"));
    }
    if !envelope::is_envelope(input) {
        return Err(TextsafeError::user(
            ErrorKind::NotEncrypted,
            "This is not an encrypted text",
        ));
    }

    let passphrase = passphrases.read_passphrase()?;
    if passphrase.is_empty() {
        return Err(TextsafeError::user(
            ErrorKind::InvalidInput,
            "Passphrase is mandatory to decrypt selection",
        ));
    }
    cipher::decrypt(input, &passphrase)
}

fn require_store(store: Option<&mut RecordStore>) -> Result<&mut RecordStore> {
    store.ok_or_else(|| {
        TextsafeError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "action requires a record store but none was opened",
        )
    })
}

fn missing_record(name: &str) -> TextsafeError {
    TextsafeError::user(ErrorKind::RecordNotFound, format!("no record named {:?}", name))
}
