//! Toolchain module - rustup, profile, channel and component management

pub mod controller;
