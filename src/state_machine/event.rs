//! Events that can occur in a conversation

use crate::session::TurnId;
use crate::transport::{ChatReply, TransportError};
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserSubmit {
        text: String,
        /// Ids for the user turn and its reply, minted by the runtime
        user_turn: TurnId,
        reply_turn: TurnId,
        at: DateTime<Utc>,
    },

    // Transport events
    ReplyReceived {
        reply_turn: TurnId,
        reply: ChatReply,
    },
    ReplyFailed {
        reply_turn: TurnId,
        error: TransportError,
    },
}

impl Event {
    /// Submission with freshly minted ids
    pub fn user_submit(text: impl Into<String>) -> Self {
        Event::UserSubmit {
            text: text.into(),
            user_turn: TurnId::new(),
            reply_turn: TurnId::new(),
            at: Utc::now(),
        }
    }
}
