//! Snapshot metadata management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot format version
pub const CACHE_VERSION: &str = "1";

/// Metadata stored next to each snapshot archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Snapshot format version
    pub cache_version: String,

    /// Full cache key the snapshot was saved under
    pub key: String,

    /// Archive file name inside the store directory
    pub archive: String,

    /// Payload entries captured, relative to the install root
    pub entries: Vec<String>,

    /// When the snapshot was written; newer wins on prefix matches
    pub created_at: DateTime<Utc>,
}

impl SnapshotMeta {
    pub fn new(key: &str, archive: &str, entries: Vec<String>) -> Self {
        Self {
            cache_version: CACHE_VERSION.to_string(),
            key: key.to_string(),
            archive: archive.to_string(),
            entries,
            created_at: Utc::now(),
        }
    }
}
