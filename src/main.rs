//! setup-rustup - provision a Rust toolchain on CI machines
//!
//! setup-rustup provides:
//! - rustup bootstrap on Linux, macOS and Windows
//! - Profile, toolchain and component installation
//! - Cargo subcommand installation through cargo-binstall
//! - Content-addressed caching of installed subcommands

use anyhow::Result;
use clap::Parser;

mod backends;
mod cache;
mod cli;
mod core;
mod extensions;
mod flows;
mod toolchain;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
