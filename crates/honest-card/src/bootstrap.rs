//! Bounded wait for the relayer SDK to become available.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::relayer::RelayerFactory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first probe.
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 50,
            interval_ms: 100,
        }
    }
}

impl RetryPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Longest time [`wait_for`] sleeps before giving up.
    pub fn total(&self) -> Duration {
        self.interval() * self.attempts
    }
}

/// Probe once, then up to `policy.attempts` more times with
/// `policy.interval` between probes.
pub async fn wait_for<T, F, Fut>(policy: &RetryPolicy, mut probe: F) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    if let Some(found) = probe().await {
        return Ok(found);
    }
    for attempt in 1..=policy.attempts {
        tokio::time::sleep(policy.interval()).await;
        if let Some(found) = probe().await {
            debug!(attempt, "relayer SDK found");
            return Ok(found);
        }
    }
    warn!(attempts = policy.attempts, "relayer SDK never appeared");
    Err(RemoteError::SdkNotLoaded {
        attempts: policy.attempts,
    })
}

/// Initialization hook exposed by an SDK once it is loaded.
#[async_trait]
pub trait SdkHook: Send {
    async fn init(self) -> Result<Arc<dyn RelayerFactory>, RemoteError>;
}

/// Wait for the SDK hook, run it and hand back the relayer factory.
pub async fn load_sdk<H, F, Fut>(
    policy: &RetryPolicy,
    probe: F,
) -> Result<Arc<dyn RelayerFactory>, RemoteError>
where
    H: SdkHook,
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<H>>,
{
    let hook = wait_for(policy, probe).await?;
    hook.init().await
}
