//! Writing results to disk
//!
//! Anything written here may be plaintext or a record store, so files are
//! created with mode 0o600 on Unix systems.

use crate::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Replace the file at `path` atomically (tempfile + fsync + rename).
///
/// Either the old contents or the new contents exist afterwards, never a
/// partial file. Missing parent directories are created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| io_error(&dir, "failed to create directory", e))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(&dir)
        .map_err(|e| io_error(&dir, "failed to create tempfile", e))?;
    temp_file
        .write_all(contents)
        .map_err(|e| io_error(temp_file.path(), "failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| io_error(temp_file.path(), "failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_error(temp_file.path(), "failed to sync file prior to rename", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_error(temp_file.path(), "failed to set tempfile permissions", e))?;
    }

    temp_file.persist(path).map_err(|e| {
        TextsafeError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Write file with secure permissions (0o600 on Unix)
pub fn write_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                TextsafeError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents)
            .map_err(|e| io_error(path, "failed to write", e))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            TextsafeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

/// Read a UTF-8 text file.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        TextsafeError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            format!("{} is not valid UTF-8", path.display()),
            e,
        )
    })
}

fn read_error(path: &Path, err: io::Error) -> TextsafeError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    TextsafeError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

fn io_error(path: &Path, what: &str, err: io::Error) -> TextsafeError {
    TextsafeError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::Io,
        format!("{} ({})", what, path.display()),
        err,
    )
}
