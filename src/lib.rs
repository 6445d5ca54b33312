//! Passphrase-based text encryption.
//!
//! Text is encrypted into an *envelope*: a string starting with
//! `data:application/octet-binary;base64,` that carries the salt, nonce and
//! sealed box. See [`cipher`] for the core and [`action`] for the
//! higher-level operations used by the command-line tool.

pub mod action;
pub mod cipher;
pub mod config;
pub mod envelope;
pub mod error;
pub mod output;
pub mod passphrase;
pub mod records;

pub use cipher::{decrypt, encrypt};
pub use error::{ErrorCategory, ErrorKind, Result, TextsafeError};
