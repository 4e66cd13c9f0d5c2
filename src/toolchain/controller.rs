//! Toolchain-level rustup operations
//!
//! Installs rustup when missing, then profile, channel and components, each
//! as a plain rustup invocation. Failures propagate unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::info;

use crate::backends::exec::CommandRunner;
use crate::backends::platform::{Downloader, PlatformBootstrap};
use crate::core::config::Profile;
use crate::core::error::Result;
use crate::core::state::RunState;

pub const RUSTUP: &str = "rustup";

/// One line of `rustup component list`: the component name, optionally
/// followed by an `(installed)` marker.
static COMPONENT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)(\s+\(installed\))?\s*$").expect("Invalid COMPONENT_LINE_RE regex")
});

/// Whether rustup had to be installed by this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStatus {
    AlreadyInstalled,
    Installed,
}

pub struct ToolchainController<'a> {
    runner: &'a dyn CommandRunner,
    bootstrap: &'a dyn PlatformBootstrap,
    downloader: &'a dyn Downloader,
    command_exists: fn(&str) -> bool,
}

impl<'a> ToolchainController<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        bootstrap: &'a dyn PlatformBootstrap,
        downloader: &'a dyn Downloader,
    ) -> Self {
        Self {
            runner,
            bootstrap,
            downloader,
            command_exists: crate::core::util::command_exists,
        }
    }

    /// Replace the PATH lookup used to detect an existing rustup
    pub fn with_command_lookup(mut self, command_exists: fn(&str) -> bool) -> Self {
        self.command_exists = command_exists;
        self
    }

    /// Install rustup through the platform bootstrap unless it is already on PATH
    pub fn ensure_bootstrap_tool(&self) -> Result<BootstrapStatus> {
        if (self.command_exists)(RUSTUP) {
            info!("Rustup is already installed.");
            return Ok(BootstrapStatus::AlreadyInstalled);
        }

        info!(os = self.bootstrap.os_label(), "Rustup not found, installing");
        self.bootstrap.install_rustup(self.runner, self.downloader)?;
        Ok(BootstrapStatus::Installed)
    }

    pub fn set_profile(&self, profile: Profile) -> Result<()> {
        self.rustup(&["set", "profile", profile.as_str()])?;
        info!("Profile {} is now the rustup profile.", profile);
        Ok(())
    }

    /// Install `channel` and make it the default toolchain.
    ///
    /// `--allow-downgrade` lets rustup settle on an older nightly when the
    /// newest one lacks a requested component, so re-runs converge.
    pub fn install_channel(&self, channel: &str, state: &mut RunState) -> Result<()> {
        self.rustup(&["toolchain", "install", channel, "--allow-downgrade"])?;
        self.rustup(&["default", channel])?;
        state.set_active_channel(channel);
        info!("Toolchain {} successfully installed.", channel);
        Ok(())
    }

    /// Install the explicit component set, or under the `complete` profile
    /// every available component not installed yet.
    ///
    /// Returns the components passed to `rustup component add`.
    pub fn install_components(
        &self,
        components: &BTreeSet<String>,
        profile: Profile,
    ) -> Result<Vec<String>> {
        let to_install: Vec<String> = match profile {
            Profile::Complete => self.available_components()?,
            _ => components.iter().cloned().collect(),
        };

        if to_install.is_empty() {
            info!("No components to install");
            return Ok(to_install);
        }

        let mut args = vec!["component".to_string(), "add".to_string()];
        args.extend(to_install.iter().cloned());
        self.runner.run(RUSTUP, &args)?;
        info!("Components {} successfully installed", to_install.join(" "));

        Ok(to_install)
    }

    /// Components rustup reports as available but not yet installed
    fn available_components(&self) -> Result<Vec<String>> {
        let output = self.rustup(&["component", "list"])?;
        Ok(parse_available_components(&output))
    }

    fn rustup(&self, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Ok(self.runner.run(RUSTUP, &args)?.stdout)
    }
}

/// Names of the components in a `rustup component list` listing that are not
/// marked `(installed)`, deduplicated in listing order
pub fn parse_available_components(listing: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    listing
        .lines()
        .filter_map(|line| COMPONENT_LINE_RE.captures(line))
        .filter(|caps| caps.get(2).is_none())
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::exec::testing::RecordingRunner;
    use crate::backends::platform::testing::FakeDownloader;
    use crate::backends::platform::LinuxBootstrap;

    const LISTING: &str = "\
cargo-x86_64-unknown-linux-gnu (installed)
clippy-x86_64-unknown-linux-gnu
llvm-tools-x86_64-unknown-linux-gnu
rust-std-x86_64-unknown-linux-gnu (installed)
rustc-x86_64-unknown-linux-gnu (installed)

rust-src
";

    fn present(_: &str) -> bool {
        true
    }

    fn absent(_: &str) -> bool {
        false
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_available_components() {
        assert_eq!(
            parse_available_components(LISTING),
            vec![
                "clippy-x86_64-unknown-linux-gnu",
                "llvm-tools-x86_64-unknown-linux-gnu",
                "rust-src",
            ]
        );
    }

    #[test]
    fn test_rustup_already_installed_skips_bootstrap() {
        let runner = RecordingRunner::new();
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader)
            .with_command_lookup(present);

        let status = controller.ensure_bootstrap_tool().unwrap();

        assert_eq!(status, BootstrapStatus::AlreadyInstalled);
        assert!(runner.commands().is_empty());
        assert!(downloader.urls.borrow().is_empty());
    }

    #[test]
    fn test_rustup_missing_runs_bootstrap() {
        let runner = RecordingRunner::new();
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader)
            .with_command_lookup(absent);

        let status = controller.ensure_bootstrap_tool().unwrap();

        assert_eq!(status, BootstrapStatus::Installed);
        assert_eq!(downloader.urls.borrow().len(), 1);
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_set_profile() {
        let runner = RecordingRunner::new();
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader);

        controller.set_profile(Profile::Complete).unwrap();

        assert_eq!(runner.commands(), vec!["rustup set profile complete"]);
    }

    #[test]
    fn test_install_channel_records_active_toolchain() {
        let runner = RecordingRunner::new();
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader);
        let mut state = RunState::new();

        controller.install_channel("1.84", &mut state).unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "rustup toolchain install 1.84 --allow-downgrade",
                "rustup default 1.84",
            ]
        );
        assert_eq!(state.active_channel().unwrap(), "1.84");
    }

    #[test]
    fn test_install_channel_failure_leaves_no_toolchain() {
        let runner = RecordingRunner::new().fail_on("rustup toolchain install");
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader);
        let mut state = RunState::new();

        assert!(controller.install_channel("nightly", &mut state).is_err());
        assert!(state.active_channel().is_err());
    }

    #[test]
    fn test_install_explicit_components_in_one_call() {
        let runner = RecordingRunner::new();
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader);

        let installed = controller
            .install_components(&set(&["rustc", "clippy", "cargo"]), Profile::Minimal)
            .unwrap();

        assert_eq!(installed, vec!["cargo", "clippy", "rustc"]);
        assert_eq!(runner.commands(), vec!["rustup component add cargo clippy rustc"]);
    }

    #[test]
    fn test_complete_profile_installs_everything_not_installed() {
        let runner = RecordingRunner::new().respond("rustup component list", LISTING);
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader);

        controller
            .install_components(&BTreeSet::new(), Profile::Complete)
            .unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "rustup component list",
                "rustup component add clippy-x86_64-unknown-linux-gnu \
llvm-tools-x86_64-unknown-linux-gnu rust-src",
            ]
        );
    }

    #[test]
    fn test_complete_profile_with_everything_installed() {
        let runner = RecordingRunner::new()
            .respond("rustup component list", "cargo (installed)\nrustc (installed)\n");
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader);

        let installed = controller
            .install_components(&BTreeSet::new(), Profile::Complete)
            .unwrap();

        assert!(installed.is_empty());
        assert_eq!(runner.commands(), vec!["rustup component list"]);
    }

    #[test]
    fn test_component_failure_propagates() {
        let runner = RecordingRunner::new().fail_on("rustup component add");
        let downloader = FakeDownloader::default();
        let controller = ToolchainController::new(&runner, &LinuxBootstrap, &downloader);

        assert!(controller
            .install_components(&set(&["clippy"]), Profile::Default)
            .is_err());
    }
}
