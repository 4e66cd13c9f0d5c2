//! Platform-specific rustup bootstrap
//!
//! Each supported OS gets its own [`PlatformBootstrap`] type. The right one is
//! picked once at startup from the reported OS identifier.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::backends::exec::CommandRunner;
use crate::core::error::{Result, SetupError};

pub const SHELL_INSTALLER_URL: &str = "https://sh.rustup.rs";
pub const WINDOWS_INSTALLER_URL: &str =
    "https://static.rust-lang.org/rustup/dist/x86_64-pc-windows-msvc/rustup-init.exe";

/// Flags passed to rustup-init on every platform. The toolchain itself is
/// installed in a later stage.
const RUSTUP_INIT_ARGS: &[&str] = &["-y", "--no-modify-path", "--default-toolchain", "none"];

pub trait Downloader {
    /// Fetch `url` into a local file and return its path
    fn download(&self, url: &str, file_name: &str) -> Result<PathBuf>;
}

/// Downloads over HTTPS into a kept temporary file
#[derive(Debug, Default)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        let download_error = |message: String| SetupError::Download {
            url: url.to_string(),
            message,
        };

        let response = reqwest::blocking::get(url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| download_error(e.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|e| download_error(e.to_string()))?;

        let dir = tempfile::Builder::new()
            .prefix("setup-rustup-")
            .tempdir()?
            .keep();
        let path = dir.join(file_name);
        let mut file = File::create(&path)?;
        file.write_all(&bytes)?;
        info!(url, path = %path.display(), "Downloaded installer");

        Ok(path)
    }
}

/// Installs rustup on one target platform
pub trait PlatformBootstrap {
    fn install_rustup(&self, runner: &dyn CommandRunner, downloader: &dyn Downloader) -> Result<()>;

    /// Label partitioning caches per platform
    fn os_label(&self) -> &'static str;
}

fn init_args(extra: &[&str]) -> Vec<String> {
    extra
        .iter()
        .chain(RUSTUP_INIT_ARGS)
        .map(|s| s.to_string())
        .collect()
}

fn install_with_shell_script(runner: &dyn CommandRunner, downloader: &dyn Downloader) -> Result<()> {
    let script = downloader.download(SHELL_INSTALLER_URL, "rustup-init.sh")?;
    info!("Shell installer downloaded");
    let script = script.to_string_lossy();
    runner.run("sh", &init_args(&[script.as_ref()]))?;
    info!("Rustup successfully installed");
    Ok(())
}

#[derive(Debug, Default)]
pub struct LinuxBootstrap;

impl PlatformBootstrap for LinuxBootstrap {
    fn install_rustup(&self, runner: &dyn CommandRunner, downloader: &dyn Downloader) -> Result<()> {
        install_with_shell_script(runner, downloader)
    }

    fn os_label(&self) -> &'static str {
        "linux"
    }
}

#[derive(Debug, Default)]
pub struct DarwinBootstrap;

impl PlatformBootstrap for DarwinBootstrap {
    fn install_rustup(&self, runner: &dyn CommandRunner, downloader: &dyn Downloader) -> Result<()> {
        install_with_shell_script(runner, downloader)
    }

    fn os_label(&self) -> &'static str {
        "macos"
    }
}

#[derive(Debug, Default)]
pub struct WindowsBootstrap;

impl PlatformBootstrap for WindowsBootstrap {
    fn install_rustup(&self, runner: &dyn CommandRunner, downloader: &dyn Downloader) -> Result<()> {
        let installer = downloader.download(WINDOWS_INSTALLER_URL, "rustup-init.exe")?;
        info!("Installer downloaded");
        runner.run(&installer.to_string_lossy(), &init_args(&[]))?;
        info!("Rustup successfully installed");
        Ok(())
    }

    fn os_label(&self) -> &'static str {
        "windows"
    }
}

/// Pick the bootstrap for an OS identifier as reported by `std::env::consts::OS`
pub fn bootstrap_for(os: &str) -> Result<Box<dyn PlatformBootstrap>> {
    match os {
        "linux" => Ok(Box::new(LinuxBootstrap)),
        "macos" => Ok(Box::new(DarwinBootstrap)),
        "windows" => Ok(Box::new(WindowsBootstrap)),
        other => Err(SetupError::UnsupportedPlatform {
            os: other.to_string(),
        }),
    }
}

/// Bootstrap for the platform this binary runs on
pub fn current_bootstrap() -> Result<Box<dyn PlatformBootstrap>> {
    bootstrap_for(std::env::consts::OS)
}


#[cfg(test)]
mod tests {
    use super::testing::FakeDownloader;
    use super::*;
    use crate::backends::exec::testing::RecordingRunner;

    #[test]
    fn test_bootstrap_for_known_platforms() {
        assert_eq!(bootstrap_for("linux").unwrap().os_label(), "linux");
        assert_eq!(bootstrap_for("macos").unwrap().os_label(), "macos");
        assert_eq!(bootstrap_for("windows").unwrap().os_label(), "windows");
    }

    #[test]
    fn test_bootstrap_for_unknown_platform() {
        let err = bootstrap_for("plan9").err().unwrap();
        assert!(matches!(err, SetupError::UnsupportedPlatform { os } if os == "plan9"));
    }

    #[cfg(unix)]
    #[test]
    fn test_linux_runs_shell_installer() {
        let runner = RecordingRunner::new();
        let downloader = FakeDownloader::default();

        LinuxBootstrap.install_rustup(&runner, &downloader).unwrap();

        assert_eq!(*downloader.urls.borrow(), vec![SHELL_INSTALLER_URL]);
        assert_eq!(
            runner.commands(),
            vec!["sh /tmp/downloads/rustup-init.sh -y --no-modify-path --default-toolchain none"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_windows_executes_downloaded_installer() {
        let runner = RecordingRunner::new();
        let downloader = FakeDownloader::default();

        WindowsBootstrap.install_rustup(&runner, &downloader).unwrap();

        assert_eq!(*downloader.urls.borrow(), vec![WINDOWS_INSTALLER_URL]);
        assert_eq!(
            runner.commands(),
            vec!["/tmp/downloads/rustup-init.exe -y --no-modify-path --default-toolchain none"]
        );
    }

    #[test]
    fn test_installer_failure_propagates() {
        let runner = RecordingRunner::new().fail_on("sh");
        let downloader = FakeDownloader::default();
        assert!(DarwinBootstrap.install_rustup(&runner, &downloader).is_err());
    }
}
