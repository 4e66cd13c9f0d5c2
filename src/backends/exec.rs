//! External process execution
//!
//! Every rustup/cargo invocation goes through a [`CommandRunner`] so stages
//! can be exercised against a recording fake.

use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::core::error::{Result, SetupError};

/// Captured result of a successful invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
}

pub trait CommandRunner {
    /// Run `program` with `args` to completion. A non-zero exit is an error.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Format a command line for logs and error messages
pub fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Runs commands as child processes. stderr is passed through so progress
/// output stays visible in the CI log; stdout is captured.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let command = display_command(program, args);
        info!("[command]{}", command);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| SetupError::CommandSpawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        for line in stdout.lines() {
            debug!("{}", line);
        }

        if !output.status.success() {
            return Err(SetupError::CommandFailed {
                command,
                status: output.status.to_string(),
            });
        }

        Ok(CommandOutput { stdout })
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording fake used by stage tests

    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct RecordingRunner {
        commands: RefCell<Vec<String>>,
        responses: Vec<(String, String)>,
        failures: Vec<String>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reply with `stdout` to every command line starting with `prefix`
        pub fn respond(mut self, prefix: &str, stdout: &str) -> Self {
            self.responses.push((prefix.to_string(), stdout.to_string()));
            self
        }

        /// Fail every command line starting with `prefix`
        pub fn fail_on(mut self, prefix: &str) -> Self {
            self.failures.push(prefix.to_string());
            self
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.borrow().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            let command = display_command(program, args);
            self.commands.borrow_mut().push(command.clone());

            if self.failures.iter().any(|p| command.starts_with(p.as_str())) {
                return Err(SetupError::CommandFailed {
                    command,
                    status: "exit status: 1".to_string(),
                });
            }

            let stdout = self
                .responses
                .iter()
                .find(|(prefix, _)| command.starts_with(prefix.as_str()))
                .map(|(_, stdout)| stdout.clone())
                .unwrap_or_default();
            Ok(CommandOutput { stdout })
        }
    }
}
