//! Opt-in retry decorator
//!
//! Disabled unless configured. A failed exchange otherwise surfaces
//! immediately and the user resubmits.

use super::{AssistantTransport, ChatReply, ChatRequest, TransportError};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first; 0 disables retrying
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::from_secs(1))
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Exponential backoff: base, 2*base, 4*base, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: AssistantTransport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<T: AssistantTransport> AssistantTransport for RetryingTransport<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let mut retry = 0;
        loop {
            match self.inner.send(request).await {
                Err(e) if e.is_retryable() && retry < self.policy.max_retries => {
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    tracing::info!(
                        retry,
                        max_retries = self.policy.max_retries,
                        delay_ms = %delay.as_millis(),
                        error_kind = %e.kind,
                        "Retrying assistant request"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
