//! Child-process launching with exit-notification tracking
//!
//! The launcher spawns children without blocking the caller, hands back an
//! opaque [`LaunchTag`] for each in-flight launch, and delivers a single
//! exit notification per launch through the callback registered at launch
//! time. Cancelling a tag only suppresses its notification; no signal is
//! ever sent to the child, which runs to completion either way.
//!
//! A blocking variant, [`run_sync`], launches a command and waits inline
//! for its exit. It never touches the registry and issues no tag.
//!
//! Environment handling differs between the two paths on purpose: the
//! async path forwards exactly `LD_LIBRARY_PATH` from the launching
//! process, the sync path forwards nothing. Call sites depend on that
//! difference, so neither path is configurable.

pub mod adapters;


use crate::registry::{LaunchRegistry, LaunchTag, Notice};
use crate::{CoreError, Result};
use adapters::{ManagedChild, ProcessAdapter};
use schema::LaunchExit;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Environment variable forwarded to async-launched children
const FORWARDED_ENV_VAR: &str = "LD_LIBRARY_PATH";

/// Launches child processes and tracks their exit notifications
///
/// The launcher shares its registry via `Arc`, so several launchers may
/// feed one registry and callbacks may hold their own handle to it.
pub struct Launcher {
    registry: Arc<LaunchRegistry>,
    adapter: Arc<dyn ProcessAdapter>,
}

impl Launcher {
    /// Create a launcher over the given registry and process adapter
    pub fn new(registry: Arc<LaunchRegistry>, adapter: Arc<dyn ProcessAdapter>) -> Self {
        Self { registry, adapter }
    }

    /// Create a launcher backed by real Unix processes
    #[cfg(unix)]
    pub fn unix(registry: Arc<LaunchRegistry>) -> Self {
        Self::new(registry, Arc::new(adapters::UnixProcessAdapter::new()))
    }

    /// Registry this launcher records in-flight launches in
    pub fn registry(&self) -> &Arc<LaunchRegistry> {
        &self.registry
    }

    /// Launch a command asynchronously and register an exit notification
    ///
    /// Returns the tag identifying this launch. The callback is invoked at
    /// most once, from a runtime worker task, after the child exits; the
    /// registry record exists before that task is spawned, so the
    /// notification can never precede the tag becoming observable. The
    /// callback runs without any registry lock held and may call
    /// [`LaunchRegistry::suppress`] or launch again.
    ///
    /// A child that never exits leaves its record and watcher task alive
    /// indefinitely; there is no watchdog reclaiming them.
    ///
    /// # Errors
    ///
    /// `ValidationError` for an empty command, `ProcessSpawn` when the OS
    /// cannot create the process. In both cases no registry entry exists
    /// and the callback is never invoked.
    pub async fn launch(
        &self,
        command: &[String],
        on_exit: impl FnOnce(LaunchExit) + Send + Sync + 'static,
    ) -> Result<LaunchTag> {
        if command.is_empty() {
            return Err(CoreError::ValidationError(
                "command must contain at least a program".to_string(),
            ));
        }

        let env = forwarded_env();
        let child = self.adapter.spawn(command, &env).await?;
        let pid = child.pid();

        // Insert before the watcher task exists so the notification cannot
        // race ahead of the tag.
        let tag = self
            .registry
            .register(pid, command.join(" "), Box::new(on_exit));
        debug!("Launched {} as pid {} with tag {}", command[0], pid, tag);

        self.spawn_exit_watcher(tag, child);

        Ok(tag)
    }

    /// Suppress the exit notification for an in-flight launch
    ///
    /// The child itself is unaffected and still runs to completion; only
    /// the callback is dropped. Unknown or already-completed tags are
    /// silently ignored.
    pub fn cancel(&self, tag: LaunchTag) {
        self.registry.suppress(tag);
    }

    fn spawn_exit_watcher(&self, tag: LaunchTag, mut child: Box<dyn ManagedChild>) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let exit = match child.wait().await {
                Ok(exit) => exit,
                Err(e) => {
                    error!("Wait failed for tag {}: {}", tag, e);
                    registry.remove(tag);
                    return;
                }
            };

            // Take the record out first; the callback must run with no
            // registry lock held.
            match registry.remove(tag) {
                Some(record) => match record.notice {
                    Notice::Armed(callback) => {
                        debug!("Delivering exit for tag {}: {}", tag, exit.describe());
                        callback(exit);
                    }
                    Notice::Suppressed => {
                        debug!("Exit for tag {} suppressed: {}", tag, exit.describe());
                    }
                },
                None => {
                    warn!("No launch record for tag {} at exit", tag);
                }
            }
        });
    }
}

/// Build the environment forwarded to async-launched children
///
/// Only `LD_LIBRARY_PATH` is copied from the launching process, and only
/// when it is set to valid UTF-8; everything else is withheld.
fn forwarded_env() -> Vec<(String, String)> {
    match std::env::var(FORWARDED_ENV_VAR) {
        Ok(value) => vec![(FORWARDED_ENV_VAR.to_string(), value)],
        Err(_) => Vec::new(),
    }
}

/// Launch a command and block until it exits
///
/// The child runs with a completely empty environment and the calling
/// thread blocks for the full duration of its execution; inside an async
/// context, call this via `spawn_blocking`. The registry is not involved
/// and no tag exists for a synchronous run.
///
/// A non-zero child exit is still `Ok`: the exit code travels as data in
/// the returned [`LaunchExit`]. Only an OS-level failure to create or wait
/// for the process is an error, and the OS diagnostic goes to the log
/// rather than into a caller-distinguishable error value.
pub fn run_sync(command: &[String]) -> Result<LaunchExit> {
    let (program, args) = command.split_first().ok_or_else(|| {
        CoreError::ValidationError("command must contain at least a program".to_string())
    })?;

    debug!("Running {} {:?} synchronously", program, args);

    let mut cmd = std::process::Command::new(program);
    cmd.args(args);
    cmd.env_clear();

    let mut child = cmd.spawn().map_err(|e| {
        info!("Failed to spawn '{}': {}", program, e);
        CoreError::ProcessSpawn(format!("Failed to spawn '{}'", program))
    })?;
    let pid = child.id();

    let status = child.wait().map_err(|e| {
        info!("Failed to wait for '{}' (pid {}): {}", program, pid, e);
        CoreError::ProcessWait(format!("Failed to wait for pid {}", pid))
    })?;

    let (exit_code, signal) = split_exit_status(&status);

    Ok(LaunchExit {
        pid,
        exit_code,
        signal,
        timestamp: LaunchExit::current_timestamp(),
    })
}

/// Split an exit status into exit-code and signal parts
pub(crate) fn split_exit_status(status: &std::process::ExitStatus) -> (Option<i32>, Option<i32>) {
    if let Some(code) = status.code() {
        (Some(code), None)
    } else {
        // On Unix, no exit code means the child was killed by a signal
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            (None, status.signal())
        }
        #[cfg(not(unix))]
        {
            (None, None)
        }
    }
}
