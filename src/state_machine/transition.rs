//! Pure state transition function
//!
//! Given the same state, session and event, `transition` always produces the
//! same result and performs no I/O. The runtime applies the returned effects.

use super::{Effect, Event, ExchangeState};
use crate::session::{Session, Turn};
use crate::transport::ChatRequest;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ExchangeState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ExchangeState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Why a submission was ignored. Never shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still pending")]
    ReplyPending,
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("submission ignored: {0}")]
    Rejected(SubmitRejection),
    #[error("reply for turn {0} does not match the request in flight")]
    StaleReply(crate::session::TurnId),
}

pub fn transition(
    state: &ExchangeState,
    session: &Session,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User submissions
        // ============================================================
        (
            _,
            Event::UserSubmit {
                text,
                user_turn,
                reply_turn,
                at,
            },
        ) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::Rejected(SubmitRejection::EmptyMessage));
            }
            // The store is checked as well as the state: a Pending turn blocks
            // submission whatever the transport or state claims.
            if state.is_busy() || session.has_pending_turn() {
                return Err(TransitionError::Rejected(SubmitRejection::ReplyPending));
            }

            let request = ChatRequest::new(text, session.conversation_id().cloned());
            let clear_notice = session.notice().map(|_| Effect::ClearNotice);

            Ok(TransitionResult::new(ExchangeState::AwaitingReply { reply_turn })
                .with_effects(clear_notice)
                .with_effect(Effect::AppendTurn(Turn::user(user_turn, text, at)))
                .with_effect(Effect::AppendTurn(Turn::pending_reply(reply_turn, at)))
                .with_effect(Effect::PublishSnapshot)
                .with_effect(Effect::SendMessage {
                    request,
                    reply_turn,
                }))
        }

        // ============================================================
        // Replies
        // ============================================================
        (
            ExchangeState::AwaitingReply { reply_turn },
            Event::ReplyReceived {
                reply_turn: received,
                reply,
            },
        ) if *reply_turn == received => {
            let adopt = session
                .conversation_id()
                .is_none()
                .then(|| Effect::AdoptConversationId(reply.conversation_id.clone()));

            Ok(TransitionResult::new(ExchangeState::Idle)
                .with_effects(adopt)
                .with_effect(Effect::deliver(received, reply.text, reply.properties))
                .with_effect(Effect::PublishSnapshot))
        }

        (
            ExchangeState::AwaitingReply { reply_turn },
            Event::ReplyFailed {
                reply_turn: failed,
                error,
            },
        ) if *reply_turn == failed => Ok(TransitionResult::new(ExchangeState::Idle)
            .with_effect(Effect::FailTurn { reply_turn: failed })
            .with_effect(Effect::ReportFailure {
                reply_turn: failed,
                error,
            })
            .with_effect(Effect::PublishSnapshot)),

        // ============================================================
        // Replies that do not belong to the request in flight
        // ============================================================
        (_, Event::ReplyReceived { reply_turn, .. } | Event::ReplyFailed { reply_turn, .. }) => {
            Err(TransitionError::StaleReply(reply_turn))
        }
    }
}
