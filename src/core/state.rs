//! Mutable state threaded through the stages of one run

use crate::core::error::{Result, SetupError};

#[derive(Debug, Default)]
pub struct RunState {
    active_channel: Option<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_channel(&mut self, channel: &str) {
        self.active_channel = Some(channel.to_string());
    }

    /// Toolchain installed by this run; an error until one has been installed
    pub fn active_channel(&self) -> Result<&str> {
        self.active_channel
            .as_deref()
            .ok_or(SetupError::NoToolchain)
    }
}
