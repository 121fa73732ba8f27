//! Unix process creation for the async launch path
//!
//! Children are spawned through `tokio::process` with an explicitly
//! constructed environment: nothing is inherited from the launching
//! process, only the pairs passed in are set. Stdout and stderr are
//! inherited as-is; this core does not capture output.
//!
//! The returned [`ChildProcess`] owns the OS handle. The child is not
//! reaped until [`ChildProcess::wait`] is awaited, so its exit status
//! stays queryable until the owner decides to collect it.

use crate::{CoreError, Result};
use tokio::process::{Child, Command};
use tracing::{debug, error};

/// A spawned child process awaiting collection of its exit status
#[derive(Debug)]
pub struct ChildProcess {
    /// The process ID of the spawned process
    pid: u32,
    /// The underlying Child handle for waiting
    child: Child,
}

impl ChildProcess {
    /// Get the process ID
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Wait for the process to exit and return its exit status (async)
    ///
    /// Awaiting this reaps the child, releasing its OS resources.
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        self.child.wait().await.map_err(|e| {
            CoreError::ProcessWait(format!("Failed to wait for process {}: {}", self.pid, e))
        })
    }
}

/// Spawn a child process with an explicitly constructed environment
///
/// `command` must be non-empty; the first element is the program (path or
/// name, resolved by the OS) and the rest are passed verbatim with no
/// shell interpretation. The child starts from an empty environment plus
/// exactly the `env` pairs given.
///
/// ## Example
///
/// ```rust,no_run
/// use altair_core::process::unix::spawn;
///
/// let command = vec!["/bin/echo".to_string(), "hello".to_string()];
/// let child = spawn(&command, &[])?;
/// println!("Spawned process with PID: {}", child.pid());
/// # Ok::<(), altair_core::CoreError>(())
/// ```
pub fn spawn(command: &[String], env: &[(String, String)]) -> Result<ChildProcess> {
    let (program, args) = command.split_first().ok_or_else(|| {
        CoreError::ValidationError("command must contain at least a program".to_string())
    })?;

    debug!("Spawning process: {} {:?}", program, args);

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.env_clear();
    for (key, value) in env {
        cmd.env(key, value);
    }

    let child = cmd.spawn().map_err(|e| {
        error!("Failed to spawn process '{}': {}", program, e);
        CoreError::ProcessSpawn(format!("Failed to spawn '{}': {}", program, e))
    })?;

    // tokio::process::Child::id() may return Option on some platforms
    let pid = child
        .id()
        .ok_or_else(|| CoreError::ProcessSpawn("Spawned child did not have a PID".to_string()))?;
    debug!("Successfully spawned process {}", pid);

    Ok(ChildProcess { pid, child })
}
