//! Mock implementations for testing
//!
//! These mocks enable runtime tests without a real assistant service.

use super::traits::{FailureObserver, FailureReport};
use crate::transport::{AssistantTransport, ChatReply, ChatRequest, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued results
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    /// Record of all requests made
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: ChatReply) {
        self.responses.lock().unwrap().push_back(Ok(reply));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record_and_pop(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock response queued")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantTransport for MockTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.record_and_pop(request)
    }

    fn endpoint(&self) -> &str {
        "mock://assistant"
    }
}

// ============================================================================
// Gated Mock Transport (for in-flight testing)
// ============================================================================

/// Mock transport that holds each reply until the test releases it
pub struct GatedMockTransport {
    inner: MockTransport,
    /// Signalled when a request arrives
    pub request_started: Notify,
    release: Notify,
}

impl GatedMockTransport {
    pub fn new() -> Self {
        Self {
            inner: MockTransport::new(),
            request_started: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.inner.recorded_requests()
    }

    /// Let the oldest held request complete
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl AssistantTransport for GatedMockTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        // notify_one stores a permit, so the test may start waiting late.
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.record_and_pop(request)
    }

    fn endpoint(&self) -> &str {
        "mock://gated-assistant"
    }
}

// ============================================================================
// Panicking Mock Transport
// ============================================================================

/// Mock transport whose first `panics` calls panic, then replays queued results
pub struct PanickingMockTransport {
    inner: MockTransport,
    panics: AtomicUsize,
}

impl PanickingMockTransport {
    pub fn new(panics: usize) -> Self {
        Self {
            inner: MockTransport::new(),
            panics: AtomicUsize::new(panics),
        }
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.inner.queue_reply(reply);
    }
}

#[async_trait]
impl AssistantTransport for PanickingMockTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let remaining = self.panics.load(Ordering::SeqCst);
        if remaining > 0 {
            self.panics.store(remaining - 1, Ordering::SeqCst);
            panic!("mock transport panicked");
        }
        self.inner.record_and_pop(request)
    }

    fn endpoint(&self) -> &str {
        "mock://panicking-assistant"
    }
}

// ============================================================================
// Recording Observer
// ============================================================================

#[derive(Default)]
pub struct RecordingObserver {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingObserver {
    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports.lock().unwrap().clone()
    }
}

impl FailureObserver for RecordingObserver {
    fn on_failure(&self, report: &FailureReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

// ============================================================================
// Runtime Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSize;
    use crate::runtime::{SessionHandle, SubmitOutcome};
    use crate::session::{
        Author, ConversationId, PropertyId, PropertyResult, Session, TurnStatus, APOLOGY_MESSAGE,
        FAILURE_NOTICE,
    };
    use crate::state_machine::SubmitRejection;
    use crate::transport::TransportErrorKind;
    use std::time::Duration;

    fn properties(count: i64) -> Vec<PropertyResult> {
        (1..=count)
            .map(|n| {
                PropertyResult::new(PropertyId::Number(n))
                    .with_attribute("title", format!("Apartment {n}"))
                    .with_attribute("area", "Lekki")
            })
            .collect()
    }

    fn spawn_with<T: AssistantTransport + 'static>(
        transport: T,
    ) -> (SessionHandle, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let (handle, _task) = SessionHandle::spawn(
            Session::new(PageSize::default()),
            transport,
            observer.clone(),
        );
        (handle, observer)
    }

    #[tokio::test]
    async fn test_mock_transport() {
        let mock = MockTransport::new();
        mock.queue_reply(ChatReply::new("c-1", "Hello", vec![]));

        let request = ChatRequest::new("hi", None);
        assert_eq!(mock.send(&request).await.unwrap().text, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.send(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// Fresh session, one successful exchange with 8 properties at page size 6
    #[tokio::test]
    async fn test_successful_exchange_with_pagination() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_reply(ChatReply::new(
            "conv-lekki",
            "I found 8 apartments in Lekki",
            properties(8),
        ));
        let (handle, observer) = spawn_with(transport.clone());

        let outcome = handle
            .submit("Show me 2-bedroom apartments in Lekki")
            .await
            .unwrap();
        let Some(reply_turn) = outcome.reply_turn() else {
            panic!("expected a reply turn, got {outcome:?}");
        };
        assert_eq!(outcome, SubmitOutcome::Delivered { reply_turn });

        let session = handle.snapshot();
        assert_eq!(session.turns().len(), 2);
        assert_eq!(session.turns()[0].author, Author::User);
        assert_eq!(session.turns()[0].text, "Show me 2-bedroom apartments in Lekki");

        let reply = session.turn(reply_turn).unwrap();
        assert_eq!(reply.status, Some(TurnStatus::Delivered));
        assert_eq!(reply.text, "I found 8 apartments in Lekki");
        assert_eq!(session.visible_properties(reply_turn).len(), 6);
        assert_eq!(session.total_pages(reply_turn), 2);
        assert_eq!(
            session.conversation_id(),
            Some(&ConversationId::new("conv-lekki"))
        );
        assert!(observer.reports().is_empty());

        // Previous at page 1 is a no-op
        assert!(!handle.previous_page(reply_turn).await.unwrap());
        assert_eq!(handle.snapshot().current_page(reply_turn), 1);

        assert!(handle.next_page(reply_turn).await.unwrap());
        let session = handle.snapshot();
        assert_eq!(session.current_page(reply_turn), 2);
        assert_eq!(session.visible_properties(reply_turn).len(), 2);

        // Next at the last page is a no-op
        assert!(!handle.next_page(reply_turn).await.unwrap());
        assert!(!handle.set_page(reply_turn, 0).await.unwrap());
        assert_eq!(handle.snapshot().current_page(reply_turn), 2);
    }

    /// A submission while a reply is pending changes nothing
    #[tokio::test]
    async fn test_submit_while_pending_is_ignored() {
        let transport = Arc::new(GatedMockTransport::new());
        transport.queue_reply(ChatReply::new("c-1", "first answer", vec![]));
        let (handle, _observer) = spawn_with(transport.clone());

        let first = tokio::spawn({
            let handle = handle.clone();
            async move { handle.submit("first question").await }
        });
        transport.request_started.notified().await;

        // Pending state is readable while the request is in flight
        let session = handle.snapshot();
        assert_eq!(session.turns().len(), 2);
        assert!(session.turns()[1].is_pending());

        let second = handle.submit("second question").await.unwrap();
        assert_eq!(second, SubmitOutcome::Ignored(SubmitRejection::ReplyPending));
        assert_eq!(handle.snapshot().turns().len(), 2);

        transport.release();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));
        assert_eq!(transport.recorded_requests().len(), 1);
        assert_eq!(handle.snapshot().turns().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_submit_is_ignored() {
        let transport = Arc::new(MockTransport::new());
        let (handle, _observer) = spawn_with(transport.clone());

        for text in ["", "   ", "\n\t"] {
            let outcome = handle.submit(text).await.unwrap();
            assert_eq!(outcome, SubmitOutcome::Ignored(SubmitRejection::EmptyMessage));
        }
        assert!(handle.snapshot().turns().is_empty());
        assert!(transport.recorded_requests().is_empty());
    }

    /// A failed exchange shows the apology and releases the lock
    #[tokio::test]
    async fn test_failure_then_recovery() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(TransportError::timeout("Request timeout: operation timed out"));
        transport.queue_reply(ChatReply::new("c-2", "Back online", vec![]));
        let (handle, observer) = spawn_with(transport.clone());

        let outcome = handle.submit("Houses in Ikeja").await.unwrap();
        let SubmitOutcome::Failed { reply_turn } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };

        let session = handle.snapshot();
        let failed = session.turn(reply_turn).unwrap();
        assert_eq!(failed.status, Some(TurnStatus::Failed));
        assert_eq!(failed.text, APOLOGY_MESSAGE);
        assert!(!failed.text.contains("timed out"));
        assert_eq!(session.notice(), Some(FAILURE_NOTICE));
        assert!(session.conversation_id().is_none());

        let reports = observer.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].reply_turn, reply_turn);
        assert_eq!(reports[0].kind, TransportErrorKind::Timeout);
        assert!(reports[0].detail.contains("timed out"));

        let outcome = handle.submit("Houses in Ikeja").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));
        let session = handle.snapshot();
        assert_eq!(session.turns().len(), 4);
        assert!(session.notice().is_none());
    }

    /// Protocol violations surface exactly like transport failures
    #[tokio::test]
    async fn test_protocol_violation_fails_turn() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(TransportError::protocol("Reply is missing conversation_id"));
        let (handle, observer) = spawn_with(transport.clone());

        let outcome = handle.submit("hello").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert_eq!(observer.reports()[0].kind, TransportErrorKind::Protocol);
        assert!(!handle.snapshot().has_pending_turn());
    }

    /// The second request carries the id assigned by the first reply
    #[tokio::test]
    async fn test_conversation_id_is_reused_and_never_replaced() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_reply(ChatReply::new("conv-a", "first", vec![]));
        transport.queue_reply(ChatReply::new("conv-b", "second", vec![]));
        transport.queue_reply(ChatReply::new("conv-c", "third", vec![]));
        let (handle, _observer) = spawn_with(transport.clone());

        for text in ["one", "two", "three"] {
            let outcome = handle.submit(text).await.unwrap();
            assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));
        }

        let requests = transport.recorded_requests();
        assert_eq!(requests[0].conversation_id, None);
        assert_eq!(requests[1].conversation_id, Some(ConversationId::new("conv-a")));
        assert_eq!(requests[2].conversation_id, Some(ConversationId::new("conv-a")));
        assert_eq!(
            handle.snapshot().conversation_id(),
            Some(&ConversationId::new("conv-a"))
        );
    }

    /// Paging an earlier reply works while another request is in flight
    #[tokio::test]
    async fn test_paging_interleaves_with_pending_request() {
        let transport = Arc::new(GatedMockTransport::new());
        transport.queue_reply(ChatReply::new("c-1", "eight results", properties(8)));
        transport.queue_reply(ChatReply::new("c-1", "follow-up", vec![]));
        let (handle, _observer) = spawn_with(transport.clone());

        transport.release();
        let first = handle.submit("apartments").await.unwrap();
        let first_turn = first.reply_turn().unwrap();
        // The first request left a stored permit behind.
        transport.request_started.notified().await;

        let pending = tokio::spawn({
            let handle = handle.clone();
            async move { handle.submit("cheaper ones?").await }
        });
        transport.request_started.notified().await;
        let mut updates = handle.subscribe();
        updates.mark_unchanged();
        assert!(handle.next_page(first_turn).await.unwrap());
        assert!(updates.has_changed().unwrap());

        let session = handle.snapshot();
        assert!(session.has_pending_turn());
        assert_eq!(session.current_page(first_turn), 2);

        transport.release();
        assert!(matches!(
            pending.await.unwrap().unwrap(),
            SubmitOutcome::Delivered { .. }
        ));
        assert_eq!(handle.snapshot().current_page(first_turn), 2);
    }

    /// A panic inside the transport fails the turn instead of wedging it
    #[tokio::test]
    async fn test_transport_panic_fails_turn_and_releases_lock() {
        let transport = Arc::new(PanickingMockTransport::new(1));
        transport.queue_reply(ChatReply::new("c-1", "Recovered", vec![]));
        let (handle, observer) = spawn_with(transport.clone());

        let outcome = tokio::time::timeout(Duration::from_secs(2), handle.submit("hello"))
            .await
            .expect("submit should resolve after a transport panic")
            .unwrap();
        let SubmitOutcome::Failed { reply_turn } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };

        let session = handle.snapshot();
        assert!(!session.has_pending_turn());
        assert_eq!(session.turn(reply_turn).unwrap().text, APOLOGY_MESSAGE);
        let reports = observer.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, TransportErrorKind::Network);
        assert!(reports[0].detail.contains("panicked"));

        let outcome = handle.submit("hello again").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));
        assert_eq!(handle.snapshot().turns().len(), 4);
    }

    #[tokio::test]
    async fn test_welcome_turn_is_kept_first() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_reply(ChatReply::new("c-1", "hello", vec![]));
        let (handle, _task) = SessionHandle::spawn(
            Session::with_welcome(PageSize::default(), "Welcome!"),
            transport.clone(),
            Arc::new(RecordingObserver::default()),
        );

        handle.submit("hi").await.unwrap();
        let session = handle.snapshot();
        assert_eq!(session.turns().len(), 3);
        assert_eq!(session.turns()[0].text, "Welcome!");
        assert!(session.turns()[0].status.is_none());
        assert_eq!(transport.recorded_requests()[0].conversation_id, None);
    }

    #[tokio::test]
    async fn test_handle_reports_closed_runtime() {
        let (handle, task) = SessionHandle::spawn(
            Session::new(PageSize::default()),
            MockTransport::new(),
            Arc::new(RecordingObserver::default()),
        );
        task.abort();
        let _ = task.await;

        assert_eq!(handle.submit("hi").await, Err(crate::runtime::SessionClosed));
    }
}
