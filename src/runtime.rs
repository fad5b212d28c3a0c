//! Runtime for executing a conversation session
//!
//! A session lives in its own task ([`SessionRuntime`]). Callers hold cloneable
//! [`SessionHandle`]s: commands go in over an mpsc channel and every change is
//! published as an immutable [`Session`] snapshot on a watch channel, so the
//! pending state can be read while a request is in flight.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub(crate) use executor::apply_session_effect;
pub use executor::SessionRuntime;
pub use traits::*;

use crate::session::{Session, TurnId};
use crate::state_machine::SubmitRejection;
use crate::transport::AssistantTransport;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 32;

/// How a submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Reply arrived and was attached to `reply_turn`
    Delivered { reply_turn: TurnId },
    /// Exchange failed; `reply_turn` now holds the apology
    Failed { reply_turn: TurnId },
    /// Nothing happened
    Ignored(SubmitRejection),
}

impl SubmitOutcome {
    pub fn reply_turn(self) -> Option<TurnId> {
        match self {
            SubmitOutcome::Delivered { reply_turn } | SubmitOutcome::Failed { reply_turn } => {
                Some(reply_turn)
            }
            SubmitOutcome::Ignored(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PageTarget {
    Page(usize),
    Next,
    Previous,
}

/// Commands accepted by the runtime
#[derive(Debug)]
pub enum Command {
    Submit {
        text: String,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    Page {
        turn_id: TurnId,
        target: PageTarget,
        reply: oneshot::Sender<bool>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("session runtime has stopped")]
pub struct SessionClosed;

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<Session>,
}

impl SessionHandle {
    /// Start a runtime for `session`. It stops once every handle is dropped.
    pub fn spawn<T>(
        session: Session,
        transport: T,
        observer: Arc<dyn FailureObserver>,
    ) -> (Self, JoinHandle<()>)
    where
        T: AssistantTransport + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.clone());
        let runtime = SessionRuntime::new(session, transport, observer, command_rx, snapshot_tx);
        let task = tokio::spawn(runtime.run());

        (
            Self {
                command_tx,
                snapshot_rx,
            },
            task,
        )
    }

    /// Submit a message and wait until its exchange is resolved. Empty input
    /// or a pending reply yields `Ignored` straight away.
    pub async fn submit(&self, text: impl Into<String>) -> Result<SubmitOutcome, SessionClosed> {
        let (reply, outcome) = oneshot::channel();
        self.command_tx
            .send(Command::Submit {
                text: text.into(),
                reply,
            })
            .await
            .map_err(|_| SessionClosed)?;
        outcome.await.map_err(|_| SessionClosed)
    }

    pub async fn set_page(&self, turn_id: TurnId, page: usize) -> Result<bool, SessionClosed> {
        self.page(turn_id, PageTarget::Page(page)).await
    }

    pub async fn next_page(&self, turn_id: TurnId) -> Result<bool, SessionClosed> {
        self.page(turn_id, PageTarget::Next).await
    }

    pub async fn previous_page(&self, turn_id: TurnId) -> Result<bool, SessionClosed> {
        self.page(turn_id, PageTarget::Previous).await
    }

    async fn page(&self, turn_id: TurnId, target: PageTarget) -> Result<bool, SessionClosed> {
        let (reply, changed) = oneshot::channel();
        self.command_tx
            .send(Command::Page {
                turn_id,
                target,
                reply,
            })
            .await
            .map_err(|_| SessionClosed)?;
        changed.await.map_err(|_| SessionClosed)
    }

    /// Latest published state
    pub fn snapshot(&self) -> Session {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every published change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.snapshot_rx.clone()
    }
}
