//! Run configuration
//!
//! Raw string inputs (flags or `INPUT_*` variables) are parsed once into an
//! immutable [`Config`] that every stage borrows.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::error::{Result, SetupError};

/// Components every profile except `complete` starts from
pub const MINIMAL_COMPONENTS: &[&str] = &["cargo", "rustc", "rust-std"];

/// Components added on top of the minimal set by the `default` profile
pub const DEFAULT_EXTRA_COMPONENTS: &[&str] = &["rust-docs", "rustfmt", "clippy"];

/// Rustup installation profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Minimal,
    Default,
    Complete,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Minimal => "minimal",
            Profile::Default => "default",
            Profile::Complete => "complete",
        }
    }

    /// Components implied by this profile. Empty for `complete`, which means
    /// "everything the toolchain offers".
    pub fn bundled_components(&self) -> Vec<&'static str> {
        match self {
            Profile::Minimal => MINIMAL_COMPONENTS.to_vec(),
            Profile::Default => MINIMAL_COMPONENTS
                .iter()
                .chain(DEFAULT_EXTRA_COMPONENTS)
                .copied()
                .collect(),
            Profile::Complete => Vec::new(),
        }
    }
}

impl FromStr for Profile {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "minimal" => Ok(Profile::Minimal),
            "default" => Ok(Profile::Default),
            "complete" => Ok(Profile::Complete),
            _ => Err(SetupError::InvalidProfile { value }),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the subcommand cache persists between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// No cache; subcommands go to cargo's default location
    #[default]
    #[serde(rename = "false")]
    Nothing,
    /// Only the bootstrap installer lives under the install root
    #[serde(rename = "binstall")]
    BinstallOnly,
    /// The bootstrap installer and every subcommand live under the install root
    All,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Nothing => "false",
            CacheMode::BinstallOnly => "binstall",
            CacheMode::All => "all",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CacheMode::Nothing)
    }
}

impl FromStr for CacheMode {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "false" => Ok(CacheMode::Nothing),
            "binstall" => Ok(CacheMode::BinstallOnly),
            "all" => Ok(CacheMode::All),
            _ => Err(SetupError::InvalidCacheMode { value }),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, unvalidated configuration values
#[derive(Debug, Clone, Default)]
pub struct ConfigInputs {
    pub channel: String,
    pub profile: String,
    pub components: String,
    pub subcommands: String,
    pub cache: String,
}

/// Parsed configuration of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    channel: String,
    profile: Profile,
    components: BTreeSet<String>,
    subcommands: BTreeSet<String>,
    cache: CacheMode,
}

impl Config {
    /// Parse raw inputs. Enum-valued inputs are validated here, before any
    /// installation step can run.
    pub fn parse(inputs: &ConfigInputs) -> Result<Self> {
        let profile: Profile = inputs.profile.parse()?;
        let cache: CacheMode = inputs.cache.parse()?;

        Ok(Self::new(
            inputs.channel.trim(),
            profile,
            split_list(&inputs.components),
            split_list(&inputs.subcommands),
            cache,
        ))
    }

    pub fn new<C, S>(
        channel: &str,
        profile: Profile,
        components: C,
        subcommands: S,
        cache: CacheMode,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let components = match profile {
            Profile::Complete => BTreeSet::new(),
            _ => components
                .into_iter()
                .map(Into::into)
                .chain(profile.bundled_components().into_iter().map(String::from))
                .collect(),
        };

        Self {
            channel: channel.to_string(),
            profile,
            components,
            subcommands: subcommands.into_iter().map(Into::into).collect(),
            cache,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn components(&self) -> &BTreeSet<String> {
        &self.components
    }

    /// Requested subcommands, deduplicated and sorted
    pub fn subcommands(&self) -> &BTreeSet<String> {
        &self.subcommands
    }

    pub fn cache(&self) -> CacheMode {
        self.cache
    }
}

/// Split a newline/space separated list, dropping blank entries
pub fn split_list(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}
