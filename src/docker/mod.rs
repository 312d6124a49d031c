//! Docker CLI backend for the container runtime.

pub mod client;

pub use client::DockerClient;

use std::time::Duration;
use tokio::time::Instant;

/// How long to wait for the daemon to answer before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonWait {
    pub attempts: u32,
    pub budget: Duration,
}

impl Default for DaemonWait {
    fn default() -> Self {
        DaemonWait {
            attempts: 3,
            budget: Duration::from_secs(10),
        }
    }
}

/// Pause after the `attempt`-th failed check: 250ms doubling up to 2s.
fn pause_after(attempt: u32) -> Duration {
    let doublings = attempt.saturating_sub(1).min(3);
    Duration::from_millis(250 << doublings).min(Duration::from_secs(2))
}

/// Poll `docker info` until the daemon answers, `wait.attempts` checks were
/// made, or `wait.budget` is spent. A daemon that was just launched often
/// refuses the first connection.
pub async fn wait_for_daemon(client: &DockerClient, wait: DaemonWait) -> bool {
    let deadline = Instant::now() + wait.budget;

    for attempt in 1..=wait.attempts {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        if client.daemon_healthy(remaining).await {
            tracing::debug!("Docker daemon answered on check {}", attempt);
            return true;
        }
        if attempt < wait.attempts {
            let pause = pause_after(attempt).min(deadline.saturating_duration_since(Instant::now()));
            tracing::debug!("Docker daemon not ready, checking again in {:?}", pause);
            tokio::time::sleep(pause).await;
        }
    }

    tracing::warn!(
        "Docker daemon did not answer within {:?} ({} checks)",
        wait.budget,
        wait.attempts
    );
    false
}
