//! Session runtime executor
//!
//! The runtime is the only writer of the [`Session`]. It runs as a single task:
//! commands from handles and replies from the transport arrive on channels and
//! are processed one at a time, so no locks are needed around session state.

use super::traits::{FailureObserver, FailureReport};
use super::{Command, PageTarget, SubmitOutcome};
use crate::session::{Session, StoreError, TurnStatus, APOLOGY_MESSAGE, FAILURE_NOTICE};
use crate::state_machine::{transition, Effect, Event, ExchangeState, TransitionError};
use crate::transport::{AssistantTransport, TransportError};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

pub struct SessionRuntime<T>
where
    T: AssistantTransport + 'static,
{
    session: Session,
    state: ExchangeState,
    transport: Arc<T>,
    observer: Arc<dyn FailureObserver>,
    command_rx: mpsc::Receiver<Command>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    snapshot_tx: watch::Sender<Session>,
    /// Completion channel of the submission currently in flight
    in_flight: Option<oneshot::Sender<SubmitOutcome>>,
}

impl<T> SessionRuntime<T>
where
    T: AssistantTransport + 'static,
{
    pub fn new(
        session: Session,
        transport: T,
        observer: Arc<dyn FailureObserver>,
        command_rx: mpsc::Receiver<Command>,
        snapshot_tx: watch::Sender<Session>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(8);
        Self {
            session,
            state: ExchangeState::Idle,
            transport: Arc::new(transport),
            observer,
            command_rx,
            event_rx,
            event_tx,
            snapshot_tx,
            in_flight: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(endpoint = %self.transport.endpoint(), "Starting session runtime");
        self.publish();

        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => self.handle_transport_event(event),
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }

        tracing::info!(
            turns = self.session.turns().len(),
            conversation_id = self.session.conversation_id().map(|id| id.as_str()),
            "Session runtime stopped"
        );
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { text, reply } => self.handle_submit(text, reply),
            Command::Page {
                turn_id,
                target,
                reply,
            } => {
                let changed = match target {
                    PageTarget::Page(page) => self.session.set_page(turn_id, page),
                    PageTarget::Next => self.session.next_page(turn_id),
                    PageTarget::Previous => self.session.previous_page(turn_id),
                };
                if changed {
                    tracing::debug!(
                        %turn_id,
                        page = self.session.current_page(turn_id),
                        "Page changed"
                    );
                    self.publish();
                }
                let _ = reply.send(changed);
            }
        }
    }

    fn handle_submit(&mut self, text: String, reply: oneshot::Sender<SubmitOutcome>) {
        match self.process_event(Event::user_submit(text)) {
            Ok(_) => {
                self.in_flight = Some(reply);
            }
            Err(TransitionError::Rejected(reason)) => {
                // Silent by contract: nothing is appended and nothing is sent.
                tracing::debug!(%reason, "Submission ignored");
                let _ = reply.send(SubmitOutcome::Ignored(reason));
            }
            Err(e) => {
                tracing::error!(error = %e, "Unexpected transition error on submit");
            }
        }
    }

    fn handle_transport_event(&mut self, event: Event) {
        match self.process_event(event) {
            Ok(Some(outcome)) => {
                if let Some(reply) = self.in_flight.take() {
                    let _ = reply.send(outcome);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Discarding transport event");
            }
        }
    }

    /// Run one event through the state machine and execute its effects.
    /// Returns the outcome of the exchange when the event resolved one.
    fn process_event(&mut self, event: Event) -> Result<Option<SubmitOutcome>, TransitionError> {
        let result = transition(&self.state, &self.session, event)?;
        self.state = result.new_state;

        let mut outcome = None;
        for effect in result.effects {
            if let Some(resolved) = self.execute_effect(effect) {
                outcome = Some(resolved);
            }
        }
        Ok(outcome)
    }

    fn execute_effect(&mut self, effect: Effect) -> Option<SubmitOutcome> {
        match effect {
            Effect::SendMessage {
                request,
                reply_turn,
            } => {
                let transport = Arc::clone(&self.transport);
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let send = tokio::spawn(async move { transport.send(&request).await });
                    let result = send.await.unwrap_or_else(|e| {
                        tracing::error!(%reply_turn, error = %e, "Transport task panicked");
                        Err(TransportError::network(format!("transport task panicked: {e}")))
                    });
                    let event = match result {
                        Ok(reply) => Event::ReplyReceived { reply_turn, reply },
                        Err(error) => Event::ReplyFailed { reply_turn, error },
                    };
                    // The runtime may already be gone; the reply is then moot.
                    let _ = event_tx.send(event).await;
                });
                None
            }

            Effect::ReportFailure { reply_turn, error } => {
                let report = FailureReport::new(
                    reply_turn,
                    self.session.conversation_id().cloned(),
                    error,
                );
                self.observer.on_failure(&report);
                None
            }

            Effect::PublishSnapshot => {
                self.publish();
                None
            }

            effect => {
                if let Err(e) = apply_session_effect(&mut self.session, &effect) {
                    tracing::error!(error = %e, ?effect, "Failed to apply effect");
                    return None;
                }
                match effect {
                    Effect::DeliverReply {
                        reply_turn,
                        properties,
                        ..
                    } => {
                        tracing::info!(
                            turn_id = %reply_turn,
                            properties = properties.len(),
                            "Reply delivered"
                        );
                        Some(SubmitOutcome::Delivered { reply_turn })
                    }
                    Effect::FailTurn { reply_turn } => Some(SubmitOutcome::Failed { reply_turn }),
                    _ => None,
                }
            }
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.session.clone());
    }
}

/// Apply an effect that mutates session state. Effects that perform I/O are
/// left to the caller.
pub(crate) fn apply_session_effect(session: &mut Session, effect: &Effect) -> Result<(), StoreError> {
    match effect {
        Effect::AppendTurn(turn) => session.store_mut().append(turn.clone()),
        Effect::ClearNotice => {
            session.set_notice(None);
            Ok(())
        }
        Effect::AdoptConversationId(id) => {
            if session.adopt_conversation_id(id.clone()) {
                tracing::info!(conversation_id = %id, "Conversation started");
            }
            Ok(())
        }
        Effect::DeliverReply {
            reply_turn,
            text,
            properties,
        } => {
            let store = session.store_mut();
            store.replace_text(*reply_turn, text.clone())?;
            store.attach_properties(*reply_turn, properties.clone())?;
            store.update_status(*reply_turn, TurnStatus::Delivered)
        }
        Effect::FailTurn { reply_turn } => {
            let store = session.store_mut();
            store.replace_text(*reply_turn, APOLOGY_MESSAGE)?;
            store.update_status(*reply_turn, TurnStatus::Failed)?;
            session.set_notice(Some(FAILURE_NOTICE));
            Ok(())
        }
        Effect::SendMessage { .. } | Effect::ReportFailure { .. } | Effect::PublishSnapshot => Ok(()),
    }
}
