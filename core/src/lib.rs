//! Core functionality for the Altair project
//!
//! This crate contains the launch registry, the asynchronous and
//! synchronous launchers, and the process plumbing used by the Altair CLI
//! and by anything else that embeds the launch core.

pub mod config;
pub mod error;
pub mod launcher;
#[cfg(unix)]
pub mod process;
pub mod registry;

// Re-export schema types for convenience
pub use schema::*;

pub use error::{CoreError, Result};
pub use launcher::{run_sync, Launcher};
pub use registry::{ExitCallback, LaunchRecord, LaunchRegistry, LaunchTag, Notice};

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}
