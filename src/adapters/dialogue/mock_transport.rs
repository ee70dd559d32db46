//! Mock Dialogue Transport for testing.
//!
//! Provides a scripted implementation of the DialogueTransport port,
//! allowing engine tests to run without a dialogue service.
//!
//! # Features
//!
//! - Scripted turn and satisfaction responses (consumed in order)
//! - Simulated latency for lock and pacing tests
//! - Error injection for rollback tests
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let transport = MockDialogueTransport::new()
//!     .with_turn(TurnResponse::question("Hi!").with_session_id("abc"))
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = transport.start(StartRequest::new(None, "test")).await?;
//! assert_eq!(transport.call_count(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    DialogueTransport, RespondRequest, SatisfactionRequest, SatisfactionResponse, StartRequest,
    TransportError, TurnResponse,
};

/// Session id used by the default turn once the script runs out.
pub const MOCK_SESSION_ID: &str = "mock-session";

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Start(StartRequest),
    Respond(RespondRequest),
    Satisfaction(SatisfactionRequest),
}

/// Scripted dialogue transport.
#[derive(Debug, Clone, Default)]
pub struct MockDialogueTransport {
    /// Replies for `start` and `respond`, shared in call order.
    turns: Arc<Mutex<VecDeque<Result<TurnResponse, TransportError>>>>,
    /// Replies for `submit_satisfaction`.
    satisfactions: Arc<Mutex<VecDeque<Result<SatisfactionResponse, TransportError>>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<MockCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDialogueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a turn reply for the next `start` or `respond`.
    pub fn with_turn(self, response: TurnResponse) -> Self {
        lock(&self.turns).push_back(Ok(response));
        self
    }

    /// Queues a failure for the next `start` or `respond`.
    pub fn with_turn_error(self, error: TransportError) -> Self {
        lock(&self.turns).push_back(Err(error));
        self
    }

    /// Queues a reply for the next `submit_satisfaction`.
    pub fn with_satisfaction(self, response: SatisfactionResponse) -> Self {
        lock(&self.satisfactions).push_back(Ok(response));
        self
    }

    /// Queues a failure for the next `submit_satisfaction`.
    pub fn with_satisfaction_error(self, error: TransportError) -> Self {
        lock(&self.satisfactions).push_back(Err(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a turn reply on an already-shared transport.
    pub fn push_turn(&self, response: TurnResponse) {
        lock(&self.turns).push_back(Ok(response));
    }

    /// Returns the number of calls made to this transport.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// User responses sent through `respond`, in order.
    pub fn sent_responses(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                MockCall::Respond(request) => Some(request.user_response.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    fn next_turn(&self) -> Result<TurnResponse, TransportError> {
        lock(&self.turns).pop_front().unwrap_or_else(|| {
            Ok(TurnResponse::question("Mock response").with_session_id(MOCK_SESSION_ID))
        })
    }

    fn next_satisfaction(&self) -> Result<SatisfactionResponse, TransportError> {
        lock(&self.satisfactions)
            .pop_front()
            .unwrap_or_else(|| Ok(SatisfactionResponse::acknowledged("Thank you!", false)))
    }
}

#[async_trait]
impl DialogueTransport for MockDialogueTransport {
    async fn start(&self, request: StartRequest) -> Result<TurnResponse, TransportError> {
        self.record(MockCall::Start(request)).await;
        let response = self.next_turn()?;
        response.check()?;
        response.require_session_id()?;
        Ok(response)
    }

    async fn respond(&self, request: RespondRequest) -> Result<TurnResponse, TransportError> {
        self.record(MockCall::Respond(request)).await;
        let response = self.next_turn()?;
        response.check()?;
        Ok(response)
    }

    async fn submit_satisfaction(
        &self,
        request: SatisfactionRequest,
    ) -> Result<SatisfactionResponse, TransportError> {
        self.record(MockCall::Satisfaction(request)).await;
        let response = self.next_satisfaction()?;
        response.check()?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DialogueSessionId;

    fn respond_request(text: &str) -> RespondRequest {
        RespondRequest {
            session_id: DialogueSessionId::new("abc").unwrap(),
            user_response: text.to_string(),
        }
    }

    #[tokio::test]
    async fn returns_turns_in_order() {
        let transport = MockDialogueTransport::new()
            .with_turn(TurnResponse::question("First").with_session_id("abc"))
            .with_turn(TurnResponse::question("Second"));

        let first = transport
            .start(StartRequest::new(None, "test"))
            .await
            .unwrap();
        let second = transport.respond(respond_request("hi")).await.unwrap();

        assert_eq!(first.content(), Some("First"));
        assert_eq!(second.content(), Some("Second"));
    }

    #[tokio::test]
    async fn returns_default_when_script_exhausted() {
        let transport = MockDialogueTransport::new();
        let response = transport
            .start(StartRequest::new(None, "test"))
            .await
            .unwrap();
        assert_eq!(response.session_id.as_deref(), Some(MOCK_SESSION_ID));
    }

    #[tokio::test]
    async fn injects_errors() {
        let transport =
            MockDialogueTransport::new().with_turn_error(TransportError::status(503, "down"));
        let err = transport.respond(respond_request("hi")).await.unwrap_err();
        assert_eq!(err, TransportError::status(503, "down"));
    }

    #[tokio::test]
    async fn start_without_session_id_is_invalid() {
        let transport = MockDialogueTransport::new().with_turn(TurnResponse::question("Hi"));
        let err = transport
            .start(StartRequest::new(None, "test"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn error_body_is_invalid() {
        let transport = MockDialogueTransport::new().with_turn(TurnResponse {
            error: Some("Invalid session".to_string()),
            ..Default::default()
        });
        let err = transport.respond(respond_request("hi")).await.unwrap_err();
        assert_eq!(err, TransportError::invalid_response("Invalid session"));
    }

    #[tokio::test]
    async fn records_calls() {
        let transport = MockDialogueTransport::new();
        transport.respond(respond_request("Search")).await.unwrap();
        transport
            .submit_satisfaction(SatisfactionRequest {
                session_id: DialogueSessionId::new("abc").unwrap(),
                is_satisfied: true,
                feedback: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.sent_responses(), vec!["Search".to_string()]);
        assert!(matches!(transport.calls()[1], MockCall::Satisfaction(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn simulates_latency() {
        let transport = MockDialogueTransport::new().with_delay(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        transport.respond(respond_request("hi")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
