//! Bounded, time-limited adapter calls

use super::traits::AdapterError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Shared limit on in-flight adapter calls plus a per-call timeout.
///
/// Clones share the same semaphore.
#[derive(Debug, Clone)]
pub struct CallPolicy {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl CallPolicy {
    pub fn new(max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `call` once a permit is free, failing with `Timeout` if it
    /// does not finish in time.
    pub async fn call<T, F>(&self, operation: &str, call: F) -> Result<T, AdapterError>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AdapterError::failed(operation, e))?;
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout {
                operation: operation.to_string(),
                after: self.timeout,
            }),
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::new(8, Duration::from_secs(30))
    }
}
