//! Altair CLI library
//!
//! Output formatting and error types shared by the `altair` binary and
//! its integration tests.

pub mod error;

pub use error::{CliError, Result};

use schema::LaunchExit;

/// Render an exit for human consumption
pub fn format_exit(exit: &LaunchExit) -> String {
    if exit.is_success() {
        format!("ok: {}", exit.describe())
    } else {
        format!("failed: {}", exit.describe())
    }
}

/// Render an exit as pretty-printed JSON
pub fn format_exit_json(exit: &LaunchExit) -> Result<String> {
    Ok(serde_json::to_string_pretty(exit)?)
}

/// Exit code the CLI should terminate with after a child exit
///
/// Mirrors the child's code when there is one; signal deaths and unknown
/// statuses map to 1.
pub fn propagated_exit_code(exit: &LaunchExit) -> i32 {
    exit.exit_code.unwrap_or(1)
}
