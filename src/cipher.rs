//! Passphrase-based text encryption using scrypt + XSalsa20Poly1305
//!
//! - scrypt derives a 32-byte key from the passphrase and a random salt
//! - NaCl secretbox (XSalsa20Poly1305) provides authenticated encryption
//!
//! The binary payload carried inside an envelope is:
//! - salt: 16 bytes
//! - nonce: 24 bytes
//! - sealed box: variable length (ciphertext plus 16-byte Poly1305 MAC)
//!
//! Every call is independent. Keys are derived, used and wiped within a
//! single call.

use crate::envelope;
use crate::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use rand::rngs::OsRng;
use scrypt::{Params, scrypt};
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 authentication tag in bytes
pub const MAC_LEN: usize = 16;

/// Length of derived key in bytes
const KEY_LEN: usize = 32;

/// scrypt log2(N) parameter (CPU/memory cost), N = 32768
const SCRYPT_LOG_N: u8 = 15;

/// scrypt r parameter (block size)
const SCRYPT_R: u32 = 8;

/// scrypt p parameter (parallelization)
const SCRYPT_P: u32 = 1;

/// Message for every decryption failure past the envelope tag check.
pub const CANNOT_DECRYPT: &str = "Cannot decrypt selected text with the provided passphrase";

fn cannot_decrypt() -> TextsafeError {
    TextsafeError::with_kind(
        ErrorCategory::User,
        ErrorKind::DecryptionFailed,
        CANNOT_DECRYPT,
    )
}

fn require_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.is_empty() {
        return Err(TextsafeError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "passphrase must not be empty",
        ));
    }
    Ok(())
}

/// Derive a 32-byte key from a passphrase and salt using scrypt
fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        TextsafeError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to create scrypt params",
            e,
        )
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt(passphrase, salt, &params, &mut key[..]).map_err(|e| {
        TextsafeError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "scrypt key derivation failed",
            e,
        )
    })?;

    Ok(key)
}

/// Seal bytes under a passphrase with a random salt and nonce.
///
/// Returns salt(16) + nonce(24) + sealedbox(variable).
pub fn seal(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_with(passphrase, plaintext, &salt, &nonce)
}

/// Seal bytes using the provided salt and nonce.
///
/// Reusing a salt/nonce pair under the same passphrase breaks the cipher.
/// Only tests and fixed vectors should call this; use `seal()` otherwise.
pub fn seal_with(
    passphrase: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let key = derive_key(passphrase, salt)?;
    let cipher = XSalsa20Poly1305::new(&(*key).into());

    let sealed_box = cipher
        .encrypt(&Nonce::from(*nonce), plaintext)
        .map_err(|_| {
            TextsafeError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::EncryptionFailed,
                "encryption failed",
            )
        })?;

    let mut output = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed_box.len());
    output.extend_from_slice(salt);
    output.extend_from_slice(nonce);
    output.extend_from_slice(&sealed_box);

    Ok(output)
}

/// Open a payload produced by `seal`.
///
/// Truncation, tampering and a wrong passphrase all produce the same
/// `DecryptionFailed` error.
pub fn open(passphrase: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() < SALT_LEN + NONCE_LEN + MAC_LEN {
        return Err(cannot_decrypt());
    }

    let (salt, rest) = payload.split_at(SALT_LEN);
    let (nonce, sealed_box) = rest.split_at(NONCE_LEN);
    let salt: &[u8; SALT_LEN] = salt.try_into().map_err(|_| cannot_decrypt())?;
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| cannot_decrypt())?;

    let key = derive_key(passphrase, salt)?;
    let cipher = XSalsa20Poly1305::new(&(*key).into());
    cipher
        .decrypt(&Nonce::from(nonce), sealed_box)
        .map_err(|_| cannot_decrypt())
}

/// Encrypt text under a passphrase, returning an envelope.
///
/// The result always starts with [`envelope::TAG`]. Two calls with the same
/// arguments produce different envelopes.
pub fn encrypt(plaintext: &str, passphrase: &str) -> Result<String> {
    require_passphrase(passphrase)?;
    let payload = seal(passphrase.as_bytes(), plaintext.as_bytes())?;
    Ok(envelope::wrap(&payload))
}

/// Encrypt text with a fixed salt and nonce. See [`seal_with`].
pub fn encrypt_with(
    plaintext: &str,
    passphrase: &str,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<String> {
    require_passphrase(passphrase)?;
    let payload = seal_with(passphrase.as_bytes(), plaintext.as_bytes(), salt, nonce)?;
    Ok(envelope::wrap(&payload))
}

/// Decrypt an envelope back into text.
///
/// A missing tag or an empty passphrase is `InvalidInput` and costs no key
/// derivation. Every other failure is `DecryptionFailed` with the message
/// [`CANNOT_DECRYPT`].
pub fn decrypt(envelope: &str, passphrase: &str) -> Result<String> {
    if !envelope::is_envelope(envelope) {
        return Err(TextsafeError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "This is not an encrypted text",
        ));
    }
    require_passphrase(passphrase)?;

    let payload = envelope::unwrap(envelope).map_err(|e| match e.kind {
        Some(ErrorKind::MalformedPayload) => cannot_decrypt(),
        _ => e,
    })?;
    let plaintext = open(passphrase.as_bytes(), &payload)?;
    String::from_utf8(plaintext).map_err(|_| cannot_decrypt())
}
