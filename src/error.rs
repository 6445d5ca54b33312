use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to the user.
    ///
    /// Internal is never a guarantee that the user did nothing wrong, only
    /// that the code cannot tell.
    Internal,

    /// The user provided invalid input or asked for something that cannot
    /// be done.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Input rejected before any cryptographic work: missing envelope tag,
    /// empty passphrase, non-UTF-8 text.
    InvalidInput,
    /// Wrong passphrase, corrupted or tampered-with data. Deliberately
    /// carries no detail about which check failed.
    DecryptionFailed,
    /// The envelope payload could not be base64 decoded.
    MalformedPayload,
    /// The underlying primitive refused to seal the plaintext.
    EncryptionFailed,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// The passphrase and its confirmation differ.
    PassphraseMismatch,
    /// There was no text to operate on.
    EmptySelection,
    /// Asked to encrypt something that already carries the envelope tag.
    AlreadyEncrypted,
    /// Asked to decrypt something without the envelope tag.
    NotEncrypted,
    /// No record with the requested name exists.
    RecordNotFound,
    /// The record store could not be loaded or saved.
    Store,
    /// The configuration file is unreadable or invalid.
    Config,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
    /// Unexpected state reached within textsafe logic.
    InternalInvariant,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct TextsafeError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Any code consuming errors MUST
    /// handle the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl TextsafeError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Shorthand for a user-caused error of the given kind.
    pub fn user(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, kind, msg)
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TextsafeError>;
