//! CLI module - Command-line interface definition and run entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::backends::exec::SystemRunner;
use crate::backends::platform::{current_bootstrap, HttpDownloader};
use crate::cache::store::LocalCacheStore;
use crate::core::config::{Config, ConfigInputs};
use crate::core::paths::{default_cache_dir, default_install_root, normalize_path, InstallPaths};
use crate::core::render::{write_step_outputs, OutputFormat, RenderConfig, Renderer};
use crate::core::util::{add_path, command_exists};
use crate::flows::setup::{run_setup, SetupContext};

/// setup-rustup - provision rustup, a toolchain and cached cargo subcommands in CI.
#[derive(Parser, Debug)]
#[command(name = "setup-rustup")]
#[command(
    author,
    version,
    about,
    long_about = r#"setup-rustup prepares a CI machine for Rust builds in one pass.

It installs rustup when missing, sets the profile, installs and activates the
requested toolchain with its components, then installs cargo subcommands with
cargo-binstall. Installed subcommands can be cached between runs under a key
derived from the requested set and the resolved install inventory.

Every option can also be given through the matching INPUT_* environment
variable, so the binary can run directly as a GitHub Actions step.

Examples:
    setup-rustup --channel stable --profile minimal
    setup-rustup --channel nightly --components "miri rust-src"
    setup-rustup --subcommands "cargo-nextest cargo-deny" --cache all
"#
)]
pub struct Cli {
    /// Toolchain channel to install and make default.
    #[arg(
        long,
        env = "INPUT_CHANNEL",
        default_value = "stable",
        value_name = "CHANNEL",
        long_help = "Toolchain channel to install and make default, e.g. stable, nightly,\n\
1.84 or nightly-2024-11-01. Re-running with an older channel converges on it."
    )]
    pub channel: String,

    /// Rustup profile (minimal/default/complete).
    #[arg(
        long,
        env = "INPUT_PROFILE",
        default_value = "minimal",
        value_name = "PROFILE",
        long_help = "Rustup profile. Case-insensitive.\n\n\
Supported values:\n\
- minimal: cargo, rustc, rust-std\n\
- default: minimal plus rust-docs, rustfmt, clippy\n\
- complete: every available component (explicit components are ignored)"
    )]
    pub profile: String,

    /// Additional components, separated by spaces or newlines.
    #[arg(long, env = "INPUT_COMPONENTS", default_value = "", value_name = "LIST")]
    pub components: String,

    /// Cargo subcommands to install, separated by spaces or newlines.
    #[arg(
        long,
        env = "INPUT_SUBCOMMANDS",
        default_value = "",
        value_name = "LIST",
        long_help = "Cargo subcommands to install with cargo-binstall, separated by spaces\n\
or newlines. Duplicates are ignored. cargo-binstall is removed again afterwards\n\
unless it is listed here itself."
    )]
    pub subcommands: String,

    /// Subcommand cache mode (false/binstall/all).
    #[arg(
        long,
        env = "INPUT_CACHE",
        default_value = "false",
        value_name = "MODE",
        long_help = "What to cache between runs. Case-insensitive.\n\n\
Supported values:\n\
- false (default): nothing\n\
- binstall: cargo-binstall only\n\
- all: cargo-binstall and every requested subcommand"
    )]
    pub cache: String,

    /// Dedicated install root for cached subcommands.
    #[arg(long, env = "SETUP_RUSTUP_INSTALL_ROOT", value_name = "DIR")]
    pub install_root: Option<PathBuf>,

    /// Directory holding cache snapshots.
    #[arg(long, env = "SETUP_RUSTUP_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Report format (json/md).
    #[arg(
        long,
        default_value = "json",
        value_parser = ["json", "md"],
        value_name = "FORMAT"
    )]
    pub format: String,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,

    /// Quiet mode (warnings and errors only).
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug diagnostics).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Log to stderr; `RUST_LOG` overrides the level picked by --verbose/--quiet
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet);

    let config = Config::parse(&ConfigInputs {
        channel: cli.channel,
        profile: cli.profile,
        components: cli.components,
        subcommands: cli.subcommands,
        cache: cli.cache,
    })?;
    debug!(?config, "Configuration parsed");

    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let install_root = match cli.install_root {
        Some(dir) => dir,
        None => default_install_root()?,
    };
    let cache_dir = match cli.cache_dir {
        Some(dir) => dir,
        None => default_cache_dir()?,
    };

    let bootstrap = current_bootstrap()?;
    let runner = SystemRunner;
    let downloader = HttpDownloader;
    let store = LocalCacheStore::new(cache_dir);
    debug!(
        install_root = %normalize_path(&install_root),
        cache_dir = %normalize_path(store.dir()),
        "Using directories"
    );

    let report = run_setup(
        &config,
        SetupContext {
            runner: &runner,
            bootstrap: bootstrap.as_ref(),
            downloader: &downloader,
            store: &store,
            paths: InstallPaths::new(install_root),
            command_exists,
            add_path,
        },
    )?;

    println!("{}", Renderer::with_config(render_config).render(&report));

    if let Some(output) = std::env::var_os("GITHUB_OUTPUT").filter(|v| !v.is_empty()) {
        let output = PathBuf::from(output);
        write_step_outputs(&output, &report)
            .with_context(|| format!("Failed to write step outputs to {}", output.display()))?;
        info!("Step outputs written");
    }

    Ok(())
}
