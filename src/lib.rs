pub mod completion;
pub mod controller;
pub mod error;
pub mod gemini;
pub mod loading_animation;
pub mod message;
pub mod mock_llm;
pub mod prompt_input;
pub mod transcript;

// Re-export commonly used types
pub use completion::{AnyCompletionClient, CompletionClient};
pub use controller::{ChatController, ConversationState};
pub use error::ServiceError;
pub use message::Message;
pub use mock_llm::MockClient;
