//! Ciphertext envelopes
//!
//! An envelope is the textual form of encrypted data:
//!
//! ```text
//! data:application/octet-binary;base64,{standard base64 with padding}
//! ```
//!
//! The tag doubles as the "is this already encrypted?" test used by callers,
//! so it must never change.

use crate::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Literal prefix of every envelope.
pub const TAG: &str = "data:application/octet-binary;base64,";

/// Wrap bytes in an envelope.
pub fn wrap(body: &[u8]) -> String {
    let encoded = STANDARD.encode(body);
    format!("{}{}", TAG, encoded)
}

/// Returns true if `text` looks like an envelope, ignoring surrounding whitespace.
///
/// Only the tag is checked; the payload may still be garbage.
pub fn is_envelope(text: &str) -> bool {
    text.trim().starts_with(TAG)
}

/// Unwrap an envelope, returning the payload bytes.
pub fn unwrap(envelope: &str) -> Result<Vec<u8>> {
    let Some(encoded) = envelope.trim().strip_prefix(TAG) else {
        return Err(TextsafeError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "input is not an encrypted envelope",
        ));
    };

    STANDARD.decode(encoded).map_err(|e| {
        TextsafeError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedPayload,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}
