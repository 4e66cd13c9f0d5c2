//! Subcommand cache manager
//!
//! Restores optimistically on the request-level key, then saves only when
//! the post-install inventory yields a key other than the one restored.

use std::path::Path;
use tracing::info;

use crate::cache::key::CacheKeys;
use crate::cache::store::CacheStore;
use crate::core::config::Config;
use crate::core::error::{Result, SetupError};
use crate::core::paths::InstallPaths;

/// Result of the single restore attempt of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub restored_key: Option<String>,
}

pub struct SubcommandCacheManager<'a> {
    store: &'a dyn CacheStore,
    paths: InstallPaths,
    keys: CacheKeys,
    active: bool,
    outcome: Option<RestoreOutcome>,
    add_path: fn(&Path) -> Result<()>,
}

impl<'a> SubcommandCacheManager<'a> {
    pub fn new(
        config: &Config,
        store: &'a dyn CacheStore,
        paths: InstallPaths,
        os_label: &str,
    ) -> Self {
        Self {
            store,
            paths,
            keys: CacheKeys::new(os_label, config.subcommands()),
            active: !config.subcommands().is_empty() && config.cache().is_enabled(),
            outcome: None,
            add_path: crate::core::util::add_path,
        }
    }

    /// Replace the hook that puts the restored `bin/` on PATH
    pub fn with_path_hook(mut self, add_path: fn(&Path) -> Result<()>) -> Self {
        self.add_path = add_path;
        self
    }

    /// False when there is nothing to cache; every operation is then a no-op
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn paths(&self) -> &InstallPaths {
        &self.paths
    }

    /// Restore the best matching snapshot. On a hit the payload is on disk and
    /// its `bin/` is on PATH before this returns.
    pub fn restore(&mut self) -> Result<RestoreOutcome> {
        if !self.active {
            let outcome = RestoreOutcome::default();
            self.outcome = Some(outcome.clone());
            return Ok(outcome);
        }

        let restored_key =
            self.store
                .restore(&self.paths, self.keys.partial(), &[self.keys.fallback()])?;

        match &restored_key {
            Some(key) => {
                info!(key = %key, "Cache restored");
                (self.add_path)(&self.paths.bin())?;
            }
            None => info!(key = self.keys.partial(), "Cache miss"),
        }

        let outcome = RestoreOutcome { restored_key };
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Save the payload under `{partial}-{inventory_digest}` unless that is
    /// exactly the key restored earlier. Returns the key written, if any.
    pub fn save(&self, inventory_digest: &str) -> Result<Option<String>> {
        if !self.active {
            return Ok(None);
        }

        let outcome = self.outcome.as_ref().ok_or(SetupError::SaveBeforeRestore)?;
        let expected = self.keys.with_inventory(inventory_digest);

        if outcome.restored_key.as_deref() == Some(expected.as_str()) {
            info!(key = %expected, "Cache is up to date, not saving");
            return Ok(None);
        }

        self.store.save(&self.paths, &expected)?;
        info!(key = %expected, "Cache saved");
        Ok(Some(expected))
    }
}
