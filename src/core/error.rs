//! Error types shared by every stage of a setup run

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid profile: {value}. Expected one of \"complete\", \"default\" or \"minimal\".")]
    InvalidProfile { value: String },

    #[error("Invalid cache mode: {value}. Expected one of \"false\", \"binstall\" or \"all\".")]
    InvalidCacheMode { value: String },

    #[error("Invalid platform: {os}.")]
    UnsupportedPlatform { os: String },

    #[error("Failed to start `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: String },

    #[error("No toolchain installed yet")]
    NoToolchain,

    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("Cache store error at {path}: {message}")]
    CacheStore { path: PathBuf, message: String },

    #[error("Cache save requested before any restore")]
    SaveBeforeRestore,

    #[error("Home directory not found")]
    HomeNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SetupError>;
