//! Final handoff to the long-running server process.

use std::fmt;
use std::os::unix::process::CommandExt;
use std::process::Command;

use crate::lifecycle::startup::StartupError;

/// The server command supplied as trailing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ServerCommand {
    /// `None` when no command was supplied.
    pub fn from_args(args: Vec<String>) -> Option<Self> {
        let mut args = args.into_iter();
        let program = args.next()?;
        Some(Self {
            program,
            args: args.collect(),
        })
    }

    /// Replace the current process image with this command.
    ///
    /// Environment, open descriptors, and signal dispositions are inherited.
    /// Only returns if the exec itself failed.
    pub fn exec(self) -> StartupError {
        tracing::info!(command = %self, "Handing off to server process");
        let source = Command::new(&self.program).args(&self.args).exec();
        StartupError::Handoff {
            program: self.program,
            source,
        }
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
