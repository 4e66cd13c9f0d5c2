//! Cache key computation
//!
//! Keys have the shape `{base}-{os}-{requested}[-{inventory}]`:
//! - `os` keeps binaries from one platform out of another platform's cache
//! - `requested` digests the requested subcommand names
//! - `inventory` digests what cargo reports as installed after the run

use std::collections::BTreeSet;

use crate::core::util::digest_base64;

/// Namespace shared by every subcommand cache key
pub const CACHE_KEY_BASE: &str = "setup-rustup-subcommands";

/// Digest of a requested subcommand set. Order and duplicates do not matter.
pub fn requested_set_digest<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sorted: BTreeSet<String> = names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();
    let joined = sorted.into_iter().collect::<Vec<_>>().join(",");
    digest_base64(joined.as_bytes())
}

/// Digest of an installed-package listing (`cargo install --list` output)
pub fn inventory_digest(listing: &str) -> String {
    digest_base64(listing.as_bytes())
}

/// Keys derived from the request, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    platform_prefix: String,
    partial: String,
}

impl CacheKeys {
    pub fn new<I, S>(os_label: &str, subcommands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let platform_prefix = format!("{}-{}", CACHE_KEY_BASE, os_label);
        let partial = format!("{}-{}", platform_prefix, requested_set_digest(subcommands));
        Self {
            platform_prefix,
            partial,
        }
    }

    /// `{base}-{os}-{requested}`: the primary restore key
    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// `{base}-{os}`: the single fallback restore key
    pub fn fallback(&self) -> &str {
        &self.platform_prefix
    }

    /// Full key for a given inventory digest, used when saving
    pub fn with_inventory(&self, inventory_digest: &str) -> String {
        format!("{}-{}", self.partial, inventory_digest)
    }
}
