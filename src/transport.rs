//! Transport adapter for the remote assistant service
//!
//! The session runtime only sees [`AssistantTransport`]. Timeouts, retries and
//! logging are layered on as decorators so the runtime stays unaware of them.

mod error;
mod http;
mod retry;
mod types;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpTransport;
pub use retry::{RetryPolicy, RetryingTransport};
pub use types::{ChatReply, ChatRequest};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for reaching the assistant service
#[async_trait]
pub trait AssistantTransport: Send + Sync {
    /// Send one message and wait for the reply
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;

    /// Where requests go, for logging
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: AssistantTransport + ?Sized> AssistantTransport for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        (**self).send(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

#[async_trait]
impl<T: AssistantTransport + ?Sized> AssistantTransport for Box<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        (**self).send(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for transports
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: AssistantTransport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: AssistantTransport> AssistantTransport for LoggingTransport<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();
        let conversation_id = request
            .conversation_id
            .as_ref()
            .map_or("<new>", |id| id.as_str());

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    conversation_id,
                    duration_ms = %duration.as_millis(),
                    properties = reply.properties.len(),
                    "Assistant request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    conversation_id,
                    duration_ms = %duration.as_millis(),
                    error_kind = %e.kind,
                    status = ?e.status,
                    error = %e.message,
                    retryable = e.is_retryable(),
                    "Assistant request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

/// Assemble the production transport stack from configuration
pub fn build_transport(
    config: &crate::config::ClientConfig,
) -> Result<Box<dyn AssistantTransport>, TransportError> {
    let http = HttpTransport::new(&config.api_base_url, config.request_timeout)?;
    let transport: Box<dyn AssistantTransport> = if config.retry.is_enabled() {
        Box::new(LoggingTransport::new(RetryingTransport::new(http, config.retry)))
    } else {
        Box::new(LoggingTransport::new(http))
    };
    Ok(transport)
}
