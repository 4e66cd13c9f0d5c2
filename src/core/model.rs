//! Run report model
//!
//! Every stage of a run appends a [`StepRecord`]; the finished [`RunReport`]
//! is rendered once at the end.

use serde::Serialize;
use std::fmt;

use crate::core::config::{CacheMode, Config, Profile};

/// Stages of a setup run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    InstallRustup,
    SetProfile,
    InstallToolchain,
    InstallComponents,
    RestoreCache,
    InstallBinstall,
    InstallSubcommands,
    SaveCache,
    UninstallBinstall,
}

impl Stage {
    /// Human-readable stage title, also used as error context
    pub fn title(&self) -> &'static str {
        match self {
            Stage::InstallRustup => "Installing rustup",
            Stage::SetProfile => "Setting profile",
            Stage::InstallToolchain => "Installing toolchain",
            Stage::InstallComponents => "Installing additional components",
            Stage::RestoreCache => "Restoring subcommand cache",
            Stage::InstallBinstall => "Installing cargo-binstall",
            Stage::InstallSubcommands => "Installing subcommands",
            Stage::SaveCache => "Saving subcommand cache",
            Stage::UninstallBinstall => "Uninstalling cargo-binstall",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Outcome of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Done,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub stage: Stage,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub channel: String,
    pub profile: Profile,
    pub components: Vec<String>,
    pub subcommands: Vec<String>,
    pub cache: CacheMode,

    /// Key of the snapshot restored at the start of the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_key: Option<String>,

    /// Key written at the end of the run (absent when the cache was already exact)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_key: Option<String>,

    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(config: &Config) -> Self {
        Self {
            channel: config.channel().to_string(),
            profile: config.profile(),
            components: config.components().iter().cloned().collect(),
            subcommands: config.subcommands().iter().cloned().collect(),
            cache: config.cache(),
            restored_key: None,
            saved_key: None,
            steps: Vec::new(),
        }
    }

    pub fn done(&mut self, stage: Stage, detail: Option<String>) {
        self.steps.push(StepRecord {
            stage,
            status: StepStatus::Done,
            detail,
        });
    }

    pub fn skipped(&mut self, stage: Stage, detail: Option<String>) {
        self.steps.push(StepRecord {
            stage,
            status: StepStatus::Skipped,
            detail,
        });
    }

    pub fn status_of(&self, stage: Stage) -> Option<StepStatus> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.stage == stage)
            .map(|step| step.status)
    }

    /// True when a snapshot was restored under a key the run did not need to rewrite
    pub fn cache_hit(&self) -> bool {
        self.restored_key.is_some() && self.saved_key.is_none()
    }
}
