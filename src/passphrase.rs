//! Passphrase reading functionality
//!
//! Passphrases are never cached: every operation asks its reader again.

use crate::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use std::io::{self, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase.
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<String>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        Ok(self.passphrase.clone())
    }
}

/// Reads passphrase from any io::Read source
///
/// A single trailing newline (`\n` or `\r\n`) is stripped so that
/// `echo secret | textsafe --passphrase-stdin ...` behaves as expected.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            TextsafeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;

        let mut len = data.len();
        if data.ends_with(b"\n") {
            len -= 1;
            if data[..len].ends_with(b"\r") {
                len -= 1;
            }
        }

        let text = std::str::from_utf8(&data[..len]).map_err(|e| {
            TextsafeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidInput,
                "passphrase is not valid UTF-8",
                e,
            )
        })?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Reads passphrase from the controlling terminal with no echo
///
/// Works while stdin is redirected; only a missing terminal is an error.
pub struct TerminalPassphraseReader {
    prompt: String,
}

impl TerminalPassphraseReader {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new("Enter the passphrase: ")
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let mut stderr = io::stderr();
        stderr
            .write_all(self.prompt.as_bytes())
            .and_then(|_| stderr.flush())
            .map_err(|e| {
                TextsafeError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // Read password *without echo*. rpassword talks to the controlling
        // terminal directly, so stdin stays free for the text itself.
        let passphrase = rpassword::read_password().map_err(|e| {
            TextsafeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                format!(
                    "no terminal available to read the passphrase from ({}); use --passphrase-stdin",
                    e
                ),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase))
    }
}

/// Reads a passphrase twice and insists both entries match
///
/// Used when encrypting.
pub struct ConfirmingPassphraseReader {
    first: Box<dyn PassphraseReader>,
    second: Box<dyn PassphraseReader>,
}

impl ConfirmingPassphraseReader {
    pub fn new(first: Box<dyn PassphraseReader>, second: Box<dyn PassphraseReader>) -> Self {
        Self { first, second }
    }

    /// Confirmation through the terminal with the usual pair of prompts.
    pub fn terminal() -> Self {
        Self::new(
            Box::new(TerminalPassphraseReader::new("Enter a passphrase: ")),
            Box::new(TerminalPassphraseReader::new("Re-enter the passphrase: ")),
        )
    }
}

impl PassphraseReader for ConfirmingPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let passphrase = self.first.read_passphrase()?;
        if passphrase.is_empty() {
            return Err(TextsafeError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidInput,
                "Empty passphrase. Operation terminated",
            ));
        }

        let confirmation = self.second.read_passphrase()?;
        if *passphrase != *confirmation {
            return Err(TextsafeError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseMismatch,
                "Password does not match",
            ));
        }

        Ok(passphrase)
    }
}
