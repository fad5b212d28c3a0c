//! Effects produced by state transitions

use crate::session::{ConversationId, PropertyResult, Turn, TurnId};
use crate::transport::{ChatRequest, TransportError};

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append a turn to the message store
    AppendTurn(Turn),

    /// Clear the failure notice left by a previous exchange
    ClearNotice,

    /// Dispatch a request to the assistant service
    SendMessage {
        request: ChatRequest,
        reply_turn: TurnId,
    },

    /// Record the server-assigned conversation id
    AdoptConversationId(ConversationId),

    /// Fill in the pending turn and mark it Delivered
    DeliverReply {
        reply_turn: TurnId,
        text: String,
        properties: Vec<PropertyResult>,
    },

    /// Replace the pending turn with the apology and mark it Failed
    FailTurn { reply_turn: TurnId },

    /// Hand the failure detail to the observer
    ReportFailure {
        reply_turn: TurnId,
        error: TransportError,
    },

    /// Publish a fresh snapshot to readers
    PublishSnapshot,
}

impl Effect {
    pub fn deliver(reply_turn: TurnId, text: String, properties: Vec<PropertyResult>) -> Self {
        Effect::DeliverReply {
            reply_turn,
            text,
            properties,
        }
    }
}
