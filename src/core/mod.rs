//! Core module - Configuration, data model and shared utilities
//!
//! This module provides:
//! - Parsed run configuration (profiles, cache modes)
//! - Error types
//! - Run report model and its rendering
//! - Install paths and PATH handling

pub mod config;
pub mod error;
pub mod model;
pub mod paths;
pub mod render;
pub mod state;
pub mod util;
