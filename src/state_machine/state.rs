//! Exchange state

use crate::session::TurnId;
use serde::{Deserialize, Serialize};

/// Where the session stands with respect to the assistant service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeState {
    /// Ready for user input, no request in flight
    #[default]
    Idle,

    /// One request in flight; `reply_turn` is its Pending assistant turn
    AwaitingReply { reply_turn: TurnId },
}

impl ExchangeState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ExchangeState::AwaitingReply { .. })
    }

    pub fn reply_turn(&self) -> Option<TurnId> {
        match self {
            ExchangeState::Idle => None,
            ExchangeState::AwaitingReply { reply_turn } => Some(*reply_turn),
        }
    }
}
