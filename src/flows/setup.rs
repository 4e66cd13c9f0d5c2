//! Setup flow - one complete provisioning run
//!
//! rustup → profile → toolchain → components → subcommands, strictly in that
//! order. The first failing stage aborts the run and names itself in the error.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::backends::exec::CommandRunner;
use crate::backends::platform::{Downloader, PlatformBootstrap};
use crate::cache::manager::SubcommandCacheManager;
use crate::cache::store::CacheStore;
use crate::core::config::Config;
use crate::core::model::{RunReport, Stage};
use crate::core::paths::{cargo_bin_dir, InstallPaths};
use crate::core::state::RunState;
use crate::extensions::installer::ExtensionInstaller;
use crate::toolchain::controller::{BootstrapStatus, ToolchainController};

/// External collaborators of a run
pub struct SetupContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub bootstrap: &'a dyn PlatformBootstrap,
    pub downloader: &'a dyn Downloader,
    pub store: &'a dyn CacheStore,
    pub paths: InstallPaths,
    pub command_exists: fn(&str) -> bool,
    pub add_path: fn(&Path) -> crate::core::error::Result<()>,
}

pub fn run_setup(config: &Config, ctx: SetupContext<'_>) -> Result<RunReport> {
    let mut report = RunReport::new(config);
    let mut state = RunState::new();

    let toolchain = ToolchainController::new(ctx.runner, ctx.bootstrap, ctx.downloader)
        .with_command_lookup(ctx.command_exists);

    let status = toolchain
        .ensure_bootstrap_tool()
        .with_context(|| Stage::InstallRustup.title())?;
    match status {
        BootstrapStatus::Installed => {
            let bin = cargo_bin_dir().with_context(|| Stage::InstallRustup.title())?;
            (ctx.add_path)(&bin).with_context(|| Stage::InstallRustup.title())?;
            report.done(Stage::InstallRustup, Some(ctx.bootstrap.os_label().to_string()));
        }
        BootstrapStatus::AlreadyInstalled => {
            report.skipped(Stage::InstallRustup, Some("already installed".to_string()));
        }
    }

    toolchain
        .set_profile(config.profile())
        .with_context(|| Stage::SetProfile.title())?;
    report.done(Stage::SetProfile, Some(config.profile().to_string()));

    toolchain
        .install_channel(config.channel(), &mut state)
        .with_context(|| Stage::InstallToolchain.title())?;
    report.done(Stage::InstallToolchain, Some(config.channel().to_string()));

    let installed = toolchain
        .install_components(config.components(), config.profile())
        .with_context(|| Stage::InstallComponents.title())?;
    if installed.is_empty() {
        report.skipped(Stage::InstallComponents, None);
    } else {
        report.done(Stage::InstallComponents, Some(installed.join(" ")));
    }
    report.components = installed;

    let mut cache =
        SubcommandCacheManager::new(config, ctx.store, ctx.paths, ctx.bootstrap.os_label())
            .with_path_hook(ctx.add_path);
    ExtensionInstaller::new(ctx.runner)
        .with_path_hook(ctx.add_path)
        .install(config, &state, &mut cache, &mut report)?;

    info!(channel = config.channel(), "Setup complete");
    Ok(report)
}
