use async_trait::async_trait;

use crate::error::ServiceError;
use crate::message::Message;

/// Generic trait for completion backends that turn a conversation history
/// into one assistant reply.
///
/// The backend is stateless per call: the caller sends the entire history
/// every time so the remote service has full context. `history` must
/// contain at least one message. Implementations never retry; retry policy
/// belongs to the caller.
#[async_trait]
pub trait CompletionClient {
    /// Request one assistant reply for the given history.
    async fn complete(&self, history: &[Message]) -> Result<String, ServiceError>;

    /// Get the name of the client (for display purposes)
    fn client_name(&self) -> &str;
}

/// Wrapper enum that implements CompletionClient for the available backends
pub enum AnyCompletionClient {
    Gemini(crate::gemini::GeminiClient),
    Mock(crate::mock_llm::MockClient),
}

#[async_trait]
impl CompletionClient for AnyCompletionClient {
    async fn complete(&self, history: &[Message]) -> Result<String, ServiceError> {
        match self {
            AnyCompletionClient::Gemini(client) => client.complete(history).await,
            AnyCompletionClient::Mock(client) => client.complete(history).await,
        }
    }

    fn client_name(&self) -> &str {
        match self {
            AnyCompletionClient::Gemini(_) => "Gemini",
            AnyCompletionClient::Mock(_) => "MockLLM",
        }
    }
}

impl AnyCompletionClient {
    /// Create a new Gemini client
    pub fn new_gemini(api_key: String, model: String) -> Self {
        AnyCompletionClient::Gemini(crate::gemini::GeminiClient::new(api_key, model))
    }

    /// Create a new mock client with default responses
    pub fn new_mock() -> Self {
        AnyCompletionClient::Mock(crate::mock_llm::MockClient::new())
    }

    /// Create a new mock client with custom responses
    pub fn new_mock_with_responses(responses: Vec<String>) -> Self {
        AnyCompletionClient::Mock(crate::mock_llm::MockClient::with_responses(responses))
    }
}
