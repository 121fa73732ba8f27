//! Test utilities for integration tests in the cli crate.

use std::time::Duration;

/// Run the given future with a timeout, failing the test if it elapses.
pub async fn run_with_timeout<F, T>(duration: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, fut)
        .await
        .expect("test timed out")
}
