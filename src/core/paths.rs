//! Filesystem locations used by a run
//!
//! The dedicated install root is kept apart from cargo's own `~/.cargo` so
//! that exactly the cached payload lives under it.

use std::path::{Path, PathBuf};

use crate::core::error::{Result, SetupError};

/// Cargo's install manifests, both written next to `bin/` under an install root
pub const CRATES_TOML: &str = ".crates.toml";
pub const CRATES2_JSON: &str = ".crates2.json";
pub const BIN_DIR: &str = "bin";

/// Dedicated install root plus the fixed set of entries that form the cache payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    root: PathBuf,
}

impl InstallPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    /// Payload entry names, relative to the root
    pub fn payload_entries(&self) -> &'static [&'static str] {
        &[BIN_DIR, CRATES_TOML, CRATES2_JSON]
    }
}

/// Default install root: `~/.setup-rustup/subcommands`
pub fn default_install_root() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(SetupError::HomeNotFound)?;
    Ok(home.join(".setup-rustup").join("subcommands"))
}

/// Default snapshot directory: `<user cache dir>/setup-rustup`
pub fn default_cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .ok_or(SetupError::HomeNotFound)?;
    Ok(base.join("setup-rustup"))
}

/// Directory rustup-init places its proxies in (`$CARGO_HOME/bin`)
pub fn cargo_bin_dir() -> Result<PathBuf> {
    if let Some(cargo_home) = std::env::var_os("CARGO_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(cargo_home).join(BIN_DIR));
    }
    let home = dirs::home_dir().ok_or(SetupError::HomeNotFound)?;
    Ok(home.join(".cargo").join(BIN_DIR))
}

/// Normalize a path to use '/' as separator (for stable logs and reports)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
