//! Backends module - External process and platform integrations
//!
//! Provides:
//! - exec: Command execution behind a trait
//! - platform: Per-OS rustup bootstrap and installer download

pub mod exec;
pub mod platform;
