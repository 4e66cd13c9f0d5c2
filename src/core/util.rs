//! Common utilities

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::Result;

/// SHA-256 of `data`, base64 encoded (standard alphabet, padded)
pub fn digest_base64(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

/// SHA-256 of `data`, hex encoded
pub fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check if a command is resolvable on PATH
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Put `dir` first on this process's PATH and export it to later CI steps.
///
/// Children spawned afterwards inherit the new PATH. When `GITHUB_PATH` is
/// set, the directory is appended to that file as well.
pub fn add_path(dir: &Path) -> Result<()> {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let already_first = std::env::split_paths(&current)
        .next()
        .map(|first| first == dir)
        .unwrap_or(false);

    if !already_first {
        let joined = prepend_path(dir, &current)?;
        std::env::set_var("PATH", joined);
        debug!(dir = %dir.display(), "Prepended to PATH");
    }

    if let Some(github_path) = std::env::var_os("GITHUB_PATH").filter(|v| !v.is_empty()) {
        append_line(Path::new(&github_path), &dir.to_string_lossy())?;
    }

    Ok(())
}

fn prepend_path(dir: &Path, current: &OsString) -> Result<OsString> {
    let mut entries: Vec<PathBuf> = vec![dir.to_path_buf()];
    entries.extend(std::env::split_paths(current).filter(|entry| entry != dir));
    std::env::join_paths(entries)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e).into())
}

/// Append one line to a file, creating it if needed
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}
