//! Observability seam for failed exchanges
//!
//! The user only ever sees the apology text. The underlying error goes here.

use crate::session::{ConversationId, TurnId};
use crate::transport::{TransportError, TransportErrorKind};
use std::sync::Arc;

/// Everything known about one failed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub reply_turn: TurnId,
    pub conversation_id: Option<ConversationId>,
    pub kind: TransportErrorKind,
    pub status: Option<u16>,
    pub detail: String,
}

impl FailureReport {
    pub fn new(
        reply_turn: TurnId,
        conversation_id: Option<ConversationId>,
        error: TransportError,
    ) -> Self {
        Self {
            reply_turn,
            conversation_id,
            kind: error.kind,
            status: error.status,
            detail: error.message,
        }
    }
}

/// Receives failure details that are withheld from the conversation
pub trait FailureObserver: Send + Sync {
    fn on_failure(&self, report: &FailureReport);
}

impl<T: FailureObserver + ?Sized> FailureObserver for Arc<T> {
    fn on_failure(&self, report: &FailureReport) {
        (**self).on_failure(report);
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Default observer: one structured `warn` event per failure
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FailureObserver for TracingObserver {
    fn on_failure(&self, report: &FailureReport) {
        tracing::warn!(
            turn_id = %report.reply_turn,
            conversation_id = report.conversation_id.as_ref().map(ConversationId::as_str),
            error_kind = %report.kind,
            status = ?report.status,
            detail = %report.detail,
            "Assistant exchange failed"
        );
    }
}
