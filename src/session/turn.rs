//! Conversation turns and the property records embedded in replies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Time-ordered turn identifier, stable for the life of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned by the assistant service on the first exchange
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

/// Lifecycle of an assistant turn created for an outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Pending,
    Delivered,
    Failed,
}

/// Property identifier. The service sends integers, but any string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyId::Number(n) => write!(f, "{n}"),
            PropertyId::Text(s) => f.write_str(s),
        }
    }
}

/// One property record from a reply. Only `id` is interpreted; every other
/// field is carried through untouched for whoever renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyResult {
    pub id: PropertyId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PropertyResult {
    pub fn new(id: PropertyId) -> Self {
        Self {
            id,
            attributes: Map::new(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// String attribute lookup, e.g. `title` or `area`
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub text: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyResult>,
    /// Only set on assistant turns that belong to a request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TurnStatus>,
}

impl Turn {
    pub fn user(id: TurnId, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            author: Author::User,
            created_at,
            properties: vec![],
            status: None,
        }
    }

    /// Placeholder reply shown while the request is in flight
    pub fn pending_reply(id: TurnId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: String::new(),
            author: Author::Assistant,
            created_at,
            properties: vec![],
            status: Some(TurnStatus::Pending),
        }
    }

    /// Synthetic greeting. Carries no status and takes no part in exchanges.
    pub fn welcome(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            text: text.into(),
            author: Author::Assistant,
            created_at: Utc::now(),
            properties: vec![],
            status: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == Some(TurnStatus::Pending)
    }
}
