//! Flows module - Operations combining toolchain and subcommand stages

pub mod setup;
