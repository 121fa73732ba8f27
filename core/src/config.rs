//! Batch file loading and validation
//!
//! This module parses a TOML batch file into `schema::CommandSpec` values
//! and performs strict validation with field-path error messages.

use crate::{CoreError, Result};
use schema::CommandSpec;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level TOML structure for a batch of commands
///
/// ```toml
/// [[commands]]
/// command = "/bin/echo"
/// args = ["hello"]
///
/// [[commands]]
/// command = "/bin/true"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    /// Commands to run, in order
    pub commands: Vec<CommandSpec>,
}

impl BatchFile {
    /// Validate the batch and return `Result<()>` with field-path errors
    pub fn validate(&self) -> Result<()> {
        if self.commands.is_empty() {
            return Err(CoreError::ValidationError(
                "commands: must contain at least one command".to_string(),
            ));
        }
        for (i, spec) in self.commands.iter().enumerate() {
            if spec.command.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "commands[{}]: command cannot be empty",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// Load a batch file from a TOML file path
pub fn load_batch_from_toml_path(path: impl AsRef<Path>) -> Result<BatchFile> {
    let data = fs::read_to_string(&path).map_err(|e| {
        CoreError::ConfigurationError(format!(
            "Failed to read batch file {:?}: {}",
            path.as_ref(),
            e
        ))
    })?;
    load_batch_from_toml_str(&data)
}

/// Load a batch file from a TOML string
pub fn load_batch_from_toml_str(input: &str) -> Result<BatchFile> {
    let batch: BatchFile = toml::from_str(input)
        .map_err(|e| CoreError::ConfigurationError(format!("TOML parse error: {}", e)))?;
    batch.validate()?;
    Ok(batch)
}
