use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ServiceError;
use crate::message::Message;

/// Mock completion backend for tests and offline use.
///
/// Replays scripted outcomes first (success or failure, in order), then
/// cycles through the configured canned responses. The optional delay
/// simulates network latency, which is what lets tests exercise the
/// stale-result path: start a request, clear the conversation, and watch
/// the late result get dropped.
pub struct MockClient {
    responses: Vec<String>,
    outcomes: Mutex<VecDeque<Result<String, ServiceError>>>,
    response_index: AtomicUsize,
    delay: Duration,
}

impl MockClient {
    /// Create a new mock client with default responses
    pub fn new() -> Self {
        Self {
            responses: vec![
                "Hello! I'm a mock model for testing purposes.".to_string(),
                "This is a simulated reply.".to_string(),
                "I can help you exercise the app without real API calls.".to_string(),
            ],
            outcomes: Mutex::new(VecDeque::new()),
            response_index: AtomicUsize::new(0),
            delay: Duration::from_millis(10),
        }
    }

    /// Create a mock client with custom responses
    pub fn with_responses(responses: Vec<String>) -> Self {
        let mut client = Self::new();
        client.responses = responses;
        client
    }

    /// Queue scripted outcomes to be replayed before the canned responses.
    pub fn with_outcomes(outcomes: Vec<Result<String, ServiceError>>) -> Self {
        let client = Self::new();
        *client.outcomes.lock().unwrap() = outcomes.into();
        client
    }

    /// Set the simulated latency per call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn complete(&self, _history: &[Message]) -> Result<String, ServiceError> {
        tokio::time::sleep(self.delay).await;

        if let Some(outcome) = self.outcomes.lock().unwrap().pop_front() {
            return outcome;
        }

        if self.responses.is_empty() {
            return Err(ServiceError::empty_response("no responses configured"));
        }

        let index = self.response_index.fetch_add(1, Ordering::Relaxed);
        Ok(self.responses[index % self.responses.len()].clone())
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl crate::completion::CompletionClient for MockClient {
    async fn complete(&self, history: &[Message]) -> Result<String, ServiceError> {
        self.complete(history).await
    }

    fn client_name(&self) -> &str {
        "MockLLM"
    }
}
