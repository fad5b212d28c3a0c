//! HTTP client for the assistant service

use super::{AssistantTransport, ChatReply, ChatRequest, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const CHAT_PATH: &str = "/api/v1/chat/message";
const HEALTH_PATH: &str = "/api/v1/chat/health";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Service health as reported by the health endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe the chat health endpoint
    pub async fn health_check(&self) -> Result<HealthStatus, TransportError> {
        let response = self
            .client
            .get(format!("{}{HEALTH_PATH}", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(TransportError::server_error(
                status.as_u16(),
                format!("HTTP {status}: {body}"),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| TransportError::protocol(format!("Failed to parse health status: {e}")))
    }
}

fn classify_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::timeout(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        TransportError::network(format!("Connection failed: {e}"))
    } else {
        TransportError::network(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl AssistantTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let response = self
            .client
            .post(format!("{}{CHAT_PATH}", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::timeout(format!("Timed out reading response: {e}"))
            } else {
                TransportError::network(format!("Failed to read response: {e}"))
            }
        })?;

        if !status.is_success() {
            return Err(TransportError::server_error(
                status.as_u16(),
                format!("HTTP {status}: {body}"),
            ));
        }

        ChatReply::from_json(&body)
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}
