//! Launch-related data structures
//!
//! Types describing a command to launch and the exit information reported
//! once a launched child process has exited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A command line to launch: a program plus its arguments
///
/// Arguments are passed to the child verbatim; no shell interpretation
/// happens anywhere in the launch path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    /// Program to execute (path or name, resolved by the OS)
    pub command: String,

    /// Arguments passed verbatim to the program
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a command spec from a program and its arguments
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Full argument vector: program first, then the arguments
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.args.len());
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Information about a child process exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchExit {
    /// Process ID that exited
    pub pid: u32,

    /// Exit code (None if killed by signal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Signal that killed the process (Unix only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,

    /// Timestamp when the exit was detected
    pub timestamp: String,
}

impl LaunchExit {
    /// Check if this represents a successful exit (code 0)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Check if this represents a failure (non-zero exit code or signal)
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Human-readable one-line description of the exit
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.exit_code, self.signal) {
            (Some(code), _) => format!("pid {} exited with code {}", self.pid, code),
            (None, Some(signal)) => format!("pid {} killed by signal {}", self.pid, signal),
            (None, None) => format!("pid {} exited with unknown status", self.pid),
        }
    }

    /// Create a current timestamp string in RFC3339 format (second precision)
    #[must_use]
    pub fn current_timestamp() -> String {
        humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
    }
}
