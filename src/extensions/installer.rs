//! Cargo subcommand installation through cargo-binstall
//!
//! Linear sequence, one pass per run:
//! restore cache → install cargo-binstall → install subcommands → save cache
//! → uninstall cargo-binstall (unless it was requested itself).
//!
//! The restore runs first so a restored `.crates.toml` lets
//! `cargo install cargo-binstall` finish as "already installed".

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::backends::exec::CommandRunner;
use crate::cache::key::inventory_digest;
use crate::cache::manager::SubcommandCacheManager;
use crate::core::config::{CacheMode, Config};
use crate::core::model::{RunReport, Stage};
use crate::core::state::RunState;

/// The bootstrap installer's crate name
pub const BINSTALL: &str = "cargo-binstall";

pub const CARGO: &str = "cargo";

type PathHook = fn(&Path) -> crate::core::error::Result<()>;

pub struct ExtensionInstaller<'a> {
    runner: &'a dyn CommandRunner,
    add_path: PathHook,
}

impl<'a> ExtensionInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            add_path: crate::core::util::add_path,
        }
    }

    /// Replace the hook that puts the install root's `bin/` on PATH
    pub fn with_path_hook(mut self, add_path: PathHook) -> Self {
        self.add_path = add_path;
        self
    }

    pub fn install(
        &self,
        config: &Config,
        state: &RunState,
        cache: &mut SubcommandCacheManager<'_>,
        report: &mut RunReport,
    ) -> Result<()> {
        if config.subcommands().is_empty() {
            report.skipped(Stage::InstallSubcommands, Some("none requested".to_string()));
            return Ok(());
        }

        let channel = state.active_channel()?;
        let cache_mode = config.cache();
        let root = cache.paths().root().to_path_buf();

        if cache.is_active() {
            debug!(key = cache.keys().partial(), "Restoring subcommand cache");
            let outcome = cache
                .restore()
                .with_context(|| Stage::RestoreCache.title())?;
            report.restored_key = outcome.restored_key.clone();
            report.done(Stage::RestoreCache, outcome.restored_key);
        } else {
            report.skipped(Stage::RestoreCache, Some("cache disabled".to_string()));
        }

        let bootstrap_root = cache_mode.is_enabled().then_some(root.as_path());
        self.install_bootstrap(channel, bootstrap_root)
            .with_context(|| Stage::InstallBinstall.title())?;
        report.done(Stage::InstallBinstall, None);

        let names: Vec<String> = config
            .subcommands()
            .iter()
            .filter(|name| name.as_str() != BINSTALL)
            .cloned()
            .collect();
        if names.is_empty() {
            report.skipped(Stage::InstallSubcommands, Some(format!("only {}", BINSTALL)));
        } else {
            let extension_root = (cache_mode == CacheMode::All).then_some(root.as_path());
            self.install_extensions(channel, &names, extension_root)
                .with_context(|| Stage::InstallSubcommands.title())?;
            report.done(Stage::InstallSubcommands, Some(names.join(" ")));
        }

        if cache.is_active() {
            let listing = self
                .installed_listing(channel, &root)
                .with_context(|| Stage::SaveCache.title())?;
            let saved = cache
                .save(&inventory_digest(&listing))
                .with_context(|| Stage::SaveCache.title())?;
            match &saved {
                Some(key) => report.done(Stage::SaveCache, Some(key.clone())),
                None => report.skipped(Stage::SaveCache, Some("cache up to date".to_string())),
            }
            report.saved_key = saved;
        } else {
            report.skipped(Stage::SaveCache, Some("cache disabled".to_string()));
        }

        if config.subcommands().contains(BINSTALL) {
            info!("{} was requested, keeping it", BINSTALL);
            report.skipped(Stage::UninstallBinstall, Some("requested".to_string()));
        } else {
            self.uninstall_bootstrap(channel, bootstrap_root)
                .with_context(|| Stage::UninstallBinstall.title())?;
            report.done(Stage::UninstallBinstall, None);
        }

        Ok(())
    }

    fn install_bootstrap(&self, channel: &str, root: Option<&Path>) -> Result<()> {
        let mut args = cargo_args(channel, &["install", BINSTALL, "--locked"]);
        push_root(&mut args, root);
        self.runner.run(CARGO, &args)?;

        if let Some(root) = root {
            (self.add_path)(&root.join(crate::core::paths::BIN_DIR))?;
        }
        info!("{} is ready", BINSTALL);
        Ok(())
    }

    /// One batched, non-interactive binstall invocation
    fn install_extensions(&self, channel: &str, names: &[String], root: Option<&Path>) -> Result<()> {
        let mut args = cargo_args(channel, &["binstall", "--no-confirm", "--disable-telemetry"]);
        push_root(&mut args, root);
        args.extend(names.iter().cloned());
        self.runner.run(CARGO, &args)?;
        info!("Subcommands {} successfully installed", names.join(" "));
        Ok(())
    }

    /// `cargo install --list` restricted to the dedicated install root
    fn installed_listing(&self, channel: &str, root: &Path) -> Result<String> {
        let mut args = cargo_args(channel, &["install", "--list"]);
        push_root(&mut args, Some(root));
        Ok(self.runner.run(CARGO, &args)?.stdout)
    }

    fn uninstall_bootstrap(&self, channel: &str, root: Option<&Path>) -> Result<()> {
        let mut args = cargo_args(channel, &["uninstall", BINSTALL]);
        push_root(&mut args, root);
        self.runner.run(CARGO, &args)?;
        info!("{} uninstalled", BINSTALL);
        Ok(())
    }
}

fn cargo_args(channel: &str, args: &[&str]) -> Vec<String> {
    std::iter::once(format!("+{}", channel))
        .chain(args.iter().map(|s| s.to_string()))
        .collect()
}

fn push_root(args: &mut Vec<String>, root: Option<&Path>) {
    if let Some(root) = root {
        args.push("--root".to_string());
        args.push(root.to_string_lossy().to_string());
    }
}
