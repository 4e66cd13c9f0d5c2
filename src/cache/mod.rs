//! Cache module - Content-addressed snapshots of installed subcommands
//!
//! Provides:
//! - Cache key computation
//! - Snapshot storage (tar archives plus meta json)
//! - Restore / save-if-changed coordination

pub mod key;
pub mod manager;
pub mod meta;
pub mod store;
