//! Renderer module
//!
//! Renders a RunReport to json or md, and exports step outputs for CI

use std::path::Path;

use crate::core::error::Result;
use crate::core::model::{RunReport, StepStatus};
use crate::core::util::append_line;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for run reports
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, report: &RunReport) -> String {
        match self.config.format {
            OutputFormat::Json => self.render_json(report),
            OutputFormat::Markdown => self.render_markdown(report),
        }
    }

    fn render_json(&self, report: &RunReport) -> String {
        let rendered = if self.config.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.unwrap_or_else(|_| "{}".to_string())
    }

    fn render_markdown(&self, report: &RunReport) -> String {
        let mut output = String::new();

        output.push_str("## Toolchain\n\n");
        output.push_str(&format!("- **Channel**: `{}`\n", report.channel));
        output.push_str(&format!("- **Profile**: `{}`\n", report.profile.as_str()));
        if report.components.is_empty() {
            output.push_str("- **Components**: all available\n");
        } else {
            output.push_str(&format!(
                "- **Components**: {}\n",
                code_list(&report.components)
            ));
        }
        output.push('\n');

        if !report.subcommands.is_empty() {
            output.push_str("## Subcommands\n\n");
            output.push_str(&format!(
                "- **Requested**: {}\n",
                code_list(&report.subcommands)
            ));
            output.push_str(&format!("- **Cache**: `{}`\n", report.cache.as_str()));
            if let Some(key) = &report.restored_key {
                output.push_str(&format!("- **Restored**: `{}`\n", key));
            }
            if let Some(key) = &report.saved_key {
                output.push_str(&format!("- **Saved**: `{}`\n", key));
            }
            output.push('\n');
        }

        output.push_str("## Steps\n\n");
        for step in &report.steps {
            let mark = match step.status {
                StepStatus::Done => "✓",
                StepStatus::Skipped => "–",
            };
            output.push_str(&format!("- {} {}", mark, step.stage.title()));
            if let Some(detail) = &step.detail {
                output.push_str(&format!(" ({})", detail));
            }
            output.push('\n');
        }

        output
    }
}

fn code_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("`{}`", item))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append `cache-hit`, `cache-key` and `toolchain` outputs to a GitHub output file
pub fn write_step_outputs(path: &Path, report: &RunReport) -> Result<()> {
    append_line(path, &format!("cache-hit={}", report.cache_hit()))?;
    let key = report
        .saved_key
        .as_deref()
        .or(report.restored_key.as_deref())
        .unwrap_or("");
    append_line(path, &format!("cache-key={}", key))?;
    append_line(path, &format!("toolchain={}", report.channel))?;
    Ok(())
}
