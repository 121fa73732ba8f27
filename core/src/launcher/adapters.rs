//! Process adapters for abstracting process creation
//!
//! This module provides traits and implementations for abstracting process
//! creation and exit waiting, enabling testing with mock implementations
//! and supporting different process backends.

use crate::{CoreError, Result};
use async_trait::async_trait;
use schema::LaunchExit;
use std::sync::Arc;
use tracing::debug;

/// Trait for creating child processes in a platform-agnostic way
#[async_trait]
pub trait ProcessAdapter: Send + Sync {
    /// Spawn a new child for the given argument vector and environment
    ///
    /// The child starts from an empty environment plus exactly the `env`
    /// pairs given.
    async fn spawn(
        &self,
        command: &[String],
        env: &[(String, String)],
    ) -> Result<Box<dyn ManagedChild>>;
}

/// Trait representing a spawned child that can be waited on
#[async_trait]
pub trait ManagedChild: Send + Sync {
    /// Get the process ID
    fn pid(&self) -> u32;

    /// Wait for the child to exit, reaping it and returning its exit info
    async fn wait(&mut self) -> Result<LaunchExit>;
}

/// Unix process adapter using the tokio process plumbing
#[cfg(unix)]
#[derive(Copy, Clone, Debug, Default)]
pub struct UnixProcessAdapter;

#[cfg(unix)]
impl UnixProcessAdapter {
    /// Create a new Unix process adapter
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
#[async_trait]
impl ProcessAdapter for UnixProcessAdapter {
    async fn spawn(
        &self,
        command: &[String],
        env: &[(String, String)],
    ) -> Result<Box<dyn ManagedChild>> {
        use crate::process::unix;

        let child = unix::spawn(command, env)?;

        Ok(Box::new(UnixManagedChild { child }))
    }
}

/// Unix managed child implementation
#[cfg(unix)]
struct UnixManagedChild {
    child: crate::process::unix::ChildProcess,
}

#[cfg(unix)]
#[async_trait]
impl ManagedChild for UnixManagedChild {
    fn pid(&self) -> u32 {
        self.child.pid()
    }

    async fn wait(&mut self) -> Result<LaunchExit> {
        let status = self.child.wait().await?;
        let (exit_code, signal) = super::split_exit_status(&status);

        Ok(LaunchExit {
            pid: self.pid(),
            exit_code,
            signal,
            timestamp: LaunchExit::current_timestamp(),
        })
    }
}

/// Mock process adapter for testing
#[derive(Debug, Clone, Default)]
pub struct MockProcessAdapter {
    /// Instructions for mock children, consumed in order
    instructions: Arc<tokio::sync::Mutex<Vec<MockInstruction>>>,
}

/// Instructions for mock child behavior
#[derive(Debug, Clone, Copy)]
pub struct MockInstruction {
    /// How long to wait before the child "exits"
    pub exit_delay: std::time::Duration,
    /// Exit code to report (None means killed by signal)
    pub exit_code: Option<i32>,
    /// Signal that killed the child (Unix only)
    pub signal: Option<i32>,
    /// Report a spawn failure instead of producing a child
    pub fail_spawn: bool,
}

impl Default for MockInstruction {
    fn default() -> Self {
        Self {
            exit_delay: std::time::Duration::from_millis(100),
            exit_code: Some(0),
            signal: None,
            fail_spawn: false,
        }
    }
}

impl MockInstruction {
    /// Instruction for a child that exits with `exit_code` after `exit_delay`
    pub fn exits_with(exit_code: i32, exit_delay: std::time::Duration) -> Self {
        Self {
            exit_delay,
            exit_code: Some(exit_code),
            signal: None,
            fail_spawn: false,
        }
    }

    /// Instruction that makes the next spawn fail
    pub fn spawn_failure() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }
}

impl MockProcessAdapter {
    /// Create a new mock adapter with no pre-configured instructions
    ///
    /// Spawns without an instruction fall back to `MockInstruction::default()`
    /// (quick successful exit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock adapter pre-loaded with instructions
    pub fn with_instructions(instructions: Vec<MockInstruction>) -> Self {
        Self {
            instructions: Arc::new(tokio::sync::Mutex::new(instructions)),
        }
    }

    /// Add an instruction for the next spawned child
    pub async fn add_instruction(&self, instruction: MockInstruction) {
        let mut instructions = self.instructions.lock().await;
        instructions.push(instruction);
    }
}

#[async_trait]
impl ProcessAdapter for MockProcessAdapter {
    async fn spawn(
        &self,
        command: &[String],
        _env: &[(String, String)],
    ) -> Result<Box<dyn ManagedChild>> {
        debug!("Spawning mock child for: {:?}", command);

        let mut instructions = self.instructions.lock().await;
        let instruction = if instructions.is_empty() {
            MockInstruction::default()
        } else {
            instructions.remove(0)
        };

        if instruction.fail_spawn {
            return Err(CoreError::ProcessSpawn(format!(
                "Mock refused to spawn {:?}",
                command
            )));
        }

        // Generate a fake PID
        let pid = rand::random::<u32>() % 65536 + 1000;

        Ok(Box::new(MockManagedChild::new(pid, instruction)))
    }
}

/// Mock managed child for testing
struct MockManagedChild {
    pid: u32,
    instruction: MockInstruction,
    started_at: std::time::Instant,
}

impl MockManagedChild {
    fn new(pid: u32, instruction: MockInstruction) -> Self {
        Self {
            pid,
            instruction,
            started_at: std::time::Instant::now(),
        }
    }
}

#[async_trait]
impl ManagedChild for MockManagedChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn wait(&mut self) -> Result<LaunchExit> {
        let elapsed = self.started_at.elapsed();
        if elapsed < self.instruction.exit_delay {
            tokio::time::sleep(self.instruction.exit_delay - elapsed).await;
        }

        Ok(LaunchExit {
            pid: self.pid,
            exit_code: self.instruction.exit_code,
            signal: self.instruction.signal,
            timestamp: LaunchExit::current_timestamp(),
        })
    }
}

// Simple random number generator for mock PIDs
mod rand {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED: AtomicU32 = AtomicU32::new(1);

    pub(crate) fn random<T>() -> T
    where
        T: From<u32>,
    {
        // Simple linear congruential generator
        let prev = SEED.load(Ordering::Relaxed);
        let next = prev.wrapping_mul(1103515245).wrapping_add(12345);
        SEED.store(next, Ordering::Relaxed);
        T::from(next)
    }
}
