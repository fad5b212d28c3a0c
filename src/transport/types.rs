//! Request and reply types for the assistant service
//!
//! Replies are decoded in two steps: serde into a permissive wire struct, then
//! validation into a [`ChatReply`]. Anything that does not fit becomes a
//! `Protocol` error so malformed data never reaches the session.

use super::TransportError;
use crate::session::{ConversationId, PropertyResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Outgoing message. `conversation_id` is serialized as `null` until the
/// service has assigned one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<ConversationId>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, conversation_id: Option<ConversationId>) -> Self {
        Self {
            message: message.into(),
            conversation_id,
        }
    }
}

/// Validated reply
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub conversation_id: ConversationId,
    pub text: String,
    pub properties: Vec<PropertyResult>,
}

impl ChatReply {
    pub fn new(
        conversation_id: impl Into<String>,
        text: impl Into<String>,
        properties: Vec<PropertyResult>,
    ) -> Self {
        Self {
            conversation_id: ConversationId::new(conversation_id),
            text: text.into(),
            properties,
        }
    }

    /// Decode and validate a response body
    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        let wire: WireReply = serde_json::from_str(body)
            .map_err(|e| TransportError::protocol(format!("Failed to parse reply: {e}")))?;
        wire.validate()
    }
}

#[derive(Debug, Deserialize)]
struct WireReply {
    conversation_id: Option<String>,
    response: Option<String>,
    #[serde(default)]
    properties: Option<Vec<Value>>,
}

impl WireReply {
    fn validate(self) -> Result<ChatReply, TransportError> {
        let conversation_id = self
            .conversation_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| TransportError::protocol("Reply is missing conversation_id"))?;

        let text = self
            .response
            .ok_or_else(|| TransportError::protocol("Reply is missing response text"))?;

        let mut seen = HashSet::new();
        let mut properties = Vec::new();
        for (index, raw) in self.properties.unwrap_or_default().into_iter().enumerate() {
            let property: PropertyResult = serde_json::from_value(raw).map_err(|e| {
                TransportError::protocol(format!("Property at index {index} is malformed: {e}"))
            })?;
            if !seen.insert(property.id.clone()) {
                return Err(TransportError::protocol(format!(
                    "Duplicate property id {}",
                    property.id
                )));
            }
            properties.push(property);
        }

        Ok(ChatReply {
            conversation_id: ConversationId::new(conversation_id),
            text,
            properties,
        })
    }
}
