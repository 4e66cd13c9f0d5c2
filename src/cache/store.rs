//! Cache store - keyed snapshots of the install root payload
//!
//! [`LocalCacheStore`] keeps one tar archive plus one JSON metadata file per
//! key in a directory that outlives the run. File names are derived from the
//! key's hex digest since keys may contain `/` and `+`.
//!
//! Only the latest snapshot of a request survives a save: older ones share
//! its `{base}-{os}-{requested}-` prefix and could never be selected again.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cache::meta::{SnapshotMeta, CACHE_VERSION};
use crate::core::error::{Result, SetupError};
use crate::core::paths::InstallPaths;
use crate::core::util::digest_hex;

/// Suffix of snapshot metadata files; other files in the store dir are ignored
pub const META_SUFFIX: &str = ".meta.json";

pub trait CacheStore {
    /// Materialize the snapshot best matching `primary_key`, then each of
    /// `fallback_keys` in order. Returns the key actually restored.
    fn restore(
        &self,
        paths: &InstallPaths,
        primary_key: &str,
        fallback_keys: &[&str],
    ) -> Result<Option<String>>;

    /// Persist the current payload under `key`, replacing any snapshot with that key
    fn save(&self, paths: &InstallPaths, key: &str) -> Result<()>;
}

/// Filesystem-backed snapshot store
#[derive(Debug, Clone)]
pub struct LocalCacheStore {
    dir: PathBuf,
}

impl LocalCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn store_error(&self, message: impl Into<String>) -> SetupError {
        SetupError::CacheStore {
            path: self.dir.clone(),
            message: message.into(),
        }
    }

    /// Read every snapshot's metadata. A missing store directory holds no snapshots.
    pub fn list(&self) -> Result<Vec<SnapshotMeta>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut metas = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_meta = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(META_SUFFIX));
            if !is_meta {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let meta: SnapshotMeta = serde_json::from_str(&content).map_err(|e| {
                self.store_error(format!("invalid metadata {}: {}", path.display(), e))
            })?;
            if meta.cache_version == CACHE_VERSION {
                metas.push(meta);
            }
        }
        Ok(metas)
    }

    /// Delete every snapshot of the same request as `key`, except `key` itself
    fn prune_superseded(&self, key: &str) -> Result<()> {
        let Some(prefix) = request_prefix(key) else {
            return Ok(());
        };

        for meta in self.list()? {
            if meta.key == key || !meta.key.starts_with(&prefix) {
                continue;
            }
            remove_entry(&self.dir.join(&meta.archive))?;
            remove_entry(&self.dir.join(meta_file_name(&meta.key)))?;
            debug!(key = %meta.key, "Pruned superseded snapshot");
        }
        Ok(())
    }

    fn unpack(&self, meta: &SnapshotMeta, paths: &InstallPaths) -> Result<()> {
        let archive_path = self.dir.join(&meta.archive);
        let file = File::open(&archive_path).map_err(|e| {
            self.store_error(format!("cannot open {}: {}", archive_path.display(), e))
        })?;

        fs::create_dir_all(paths.root())?;
        let staging = tempfile::Builder::new()
            .prefix(".restore-")
            .tempdir_in(paths.root())?;
        tar::Archive::new(file).unpack(staging.path())?;

        for entry in paths.payload_entries() {
            let target = paths.root().join(entry);
            remove_entry(&target)?;
            let staged = staging.path().join(entry);
            if staged.exists() {
                fs::rename(&staged, &target)?;
            }
        }
        Ok(())
    }
}

impl CacheStore for LocalCacheStore {
    fn restore(
        &self,
        paths: &InstallPaths,
        primary_key: &str,
        fallback_keys: &[&str],
    ) -> Result<Option<String>> {
        let metas = self.list()?;
        let mut keys = vec![primary_key];
        keys.extend_from_slice(fallback_keys);

        let meta = match select_snapshot(&metas, &keys) {
            Some(meta) => meta,
            None => {
                info!(key = primary_key, "No cached snapshot found");
                return Ok(None);
            }
        };

        self.unpack(meta, paths)?;
        info!(key = %meta.key, "Restored cached snapshot");
        Ok(Some(meta.key.clone()))
    }

    fn save(&self, paths: &InstallPaths, key: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let present: Vec<&str> = paths
            .payload_entries()
            .iter()
            .copied()
            .filter(|entry| paths.root().join(entry).exists())
            .collect();
        if present.is_empty() {
            return Err(self.store_error(format!(
                "nothing to save under {}",
                paths.root().display()
            )));
        }

        let name = digest_hex(key.as_bytes());
        let archive_name = format!("{}.tar", name);

        let temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        let mut builder = tar::Builder::new(temp);
        for entry in &present {
            let source = paths.root().join(entry);
            if source.is_dir() {
                builder.append_dir_all(entry, &source)?;
            } else {
                builder.append_path_with_name(&source, entry)?;
            }
        }
        let temp = builder.into_inner()?;
        temp.persist(self.dir.join(&archive_name))
            .map_err(|e| e.error)?;

        let meta = SnapshotMeta::new(
            key,
            &archive_name,
            present.iter().map(|e| e.to_string()).collect(),
        );
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| self.store_error(e.to_string()))?;
        let mut meta_temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        meta_temp.write_all(json.as_bytes())?;
        meta_temp
            .persist(self.dir.join(meta_file_name(key)))
            .map_err(|e| e.error)?;

        self.prune_superseded(key)?;

        debug!(key, archive = %archive_name, "Snapshot written");
        Ok(())
    }
}

/// Pick the snapshot for the first key that matches anything: an exact key
/// match wins, otherwise the newest snapshot whose key starts with it.
pub fn select_snapshot<'m>(metas: &'m [SnapshotMeta], keys: &[&str]) -> Option<&'m SnapshotMeta> {
    for key in keys {
        if let Some(exact) = metas.iter().find(|meta| meta.key == *key) {
            return Some(exact);
        }
        let newest = metas
            .iter()
            .filter(|meta| meta.key.starts_with(key))
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.key.cmp(&b.key))
            });
        if newest.is_some() {
            return newest;
        }
    }
    None
}

fn meta_file_name(key: &str) -> String {
    format!("{}{}", digest_hex(key.as_bytes()), META_SUFFIX)
}

/// `{partial}-` for a full `{partial}-{inventory}` key
fn request_prefix(key: &str) -> Option<String> {
    key.rsplit_once('-')
        .map(|(partial, _)| format!("{}-", partial))
}

/// Remove a file or directory tree; absent paths are fine
fn remove_entry(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
pub mod testing {
    //! In-memory store used by manager and installer tests

    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct MemoryStore {
        pub snapshots: RefCell<Vec<SnapshotMeta>>,
        pub restores: RefCell<Vec<(String, Vec<String>)>>,
        pub saves: RefCell<Vec<String>>,
        pub fail_save: bool,
    }

    impl MemoryStore {
        pub fn with_keys(keys: &[&str]) -> Self {
            let store = Self::default();
            for key in keys {
                store
                    .snapshots
                    .borrow_mut()
                    .push(SnapshotMeta::new(key, "snapshot.tar", Vec::new()));
            }
            store
        }
    }

    impl CacheStore for MemoryStore {
        fn restore(
            &self,
            _paths: &InstallPaths,
            primary_key: &str,
            fallback_keys: &[&str],
        ) -> Result<Option<String>> {
            self.restores.borrow_mut().push((
                primary_key.to_string(),
                fallback_keys.iter().map(|k| k.to_string()).collect(),
            ));
            let snapshots = self.snapshots.borrow();
            let mut keys = vec![primary_key];
            keys.extend_from_slice(fallback_keys);
            Ok(select_snapshot(&snapshots, &keys).map(|meta| meta.key.clone()))
        }

        fn save(&self, _paths: &InstallPaths, key: &str) -> Result<()> {
            if self.fail_save {
                return Err(SetupError::CacheStore {
                    path: PathBuf::from("memory"),
                    message: "save rejected".to_string(),
                });
            }
            self.saves.borrow_mut().push(key.to_string());
            Ok(())
        }
    }
}
