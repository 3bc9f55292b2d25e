use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::completion::{AnyCompletionClient, CompletionClient};
use crate::message::Message;

/// Where the conversation stands right now. Exactly one variant holds at
/// any observable instant; every non-idle variant carries the full history
/// so observers never have to reassemble the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationState {
    /// No history yet. Initial state, and the state after a clear.
    Idle,
    /// A request is in flight. History ends with the user message that
    /// started it; the assistant's reply is not in yet.
    Pending { history: Vec<Message> },
    /// Last exchange completed. History ends with the assistant's reply.
    Settled { history: Vec<Message> },
    /// Last exchange failed. The triggering user message stays in history
    /// with no assistant reply for it; resending is the retry.
    Failed { history: Vec<Message>, error: String },
}

impl ConversationState {
    /// The transcript visible in this state. Empty while idle.
    pub fn history(&self) -> &[Message] {
        match self {
            ConversationState::Idle => &[],
            ConversationState::Pending { history }
            | ConversationState::Settled { history }
            | ConversationState::Failed { history, .. } => history,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ConversationState::Pending { .. })
    }

    /// The error banner text, if the last exchange failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            ConversationState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

struct ControllerInner {
    state: ConversationState,
    /// Bumped on every send and clear. A completion may only be applied
    /// while the generation it was started under is still current.
    generation: u64,
    observers: Vec<mpsc::UnboundedSender<ConversationState>>,
}

impl ControllerInner {
    fn set_state(&mut self, state: ConversationState) {
        debug!(generation = self.generation, ?state, "conversation transition");
        self.state = state;
        let snapshot = self.state.clone();
        self.observers
            .retain(|observer| observer.send(snapshot.clone()).is_ok());
    }
}

/// Owns the conversation: ordered message history, the single
/// loading/error status, and the serialization of user input against the
/// in-flight completion call.
///
/// `send_message` and `clear_chat` are meant to be called from one logical
/// sequence (an event loop, a REPL); the completion call itself runs on a
/// spawned task and its result is applied through the same internal lock,
/// so observers only ever see whole transitions.
pub struct ChatController {
    inner: Arc<Mutex<ControllerInner>>,
    client: Arc<AnyCompletionClient>,
}

impl ChatController {
    /// The client arrives fully configured; the controller reads no
    /// configuration sources itself.
    pub fn new(client: AnyCompletionClient) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControllerInner {
                state: ConversationState::Idle,
                generation: 0,
                observers: Vec::new(),
            })),
            client: Arc::new(client),
        }
    }

    /// Append a user message and start a completion for it.
    ///
    /// A no-op when `text` is empty after trimming. Otherwise the text is
    /// stored verbatim (whitespace preserved), the state moves to
    /// `Pending`, and control returns immediately; the `Settled` or
    /// `Failed` transition arrives through the observers once the call
    /// resolves. A result that resolves after `clear_chat` or after a
    /// newer send is discarded.
    pub fn send_message(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        let (generation, history) = {
            let mut inner = self.inner.lock().unwrap();
            let mut history = inner.state.history().to_vec();
            history.push(Message::user(text));
            inner.generation += 1;
            let generation = inner.generation;
            inner.set_state(ConversationState::Pending {
                history: history.clone(),
            });
            (generation, history)
        };

        let client = Arc::clone(&self.client);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = client.complete(&history).await;

            let mut guard = inner.lock().unwrap();
            if guard.generation != generation {
                debug!(generation, current = guard.generation, "discarding stale completion");
                return;
            }

            match outcome {
                Ok(reply) => {
                    let mut history = history;
                    history.push(Message::assistant(reply));
                    guard.set_state(ConversationState::Settled { history });
                }
                Err(err) => {
                    guard.set_state(ConversationState::Failed {
                        history,
                        error: err.to_string(),
                    });
                }
            }
        });
    }

    /// Drop the whole conversation and go back to `Idle`.
    ///
    /// Safe while a request is pending: the in-flight result fails its
    /// generation check and never reappears.
    pub fn clear_chat(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        inner.set_state(ConversationState::Idle);
    }

    /// Register an observer. Every transition from now on is delivered to
    /// the returned receiver exactly once, in order. Dropping the receiver
    /// unsubscribes; the controller prunes closed channels on the next
    /// transition.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ConversationState> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().observers.push(tx);
        rx
    }

    /// Owned snapshot of the current state.
    pub fn state(&self) -> ConversationState {
        self.inner.lock().unwrap().state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::mock_llm::MockClient;
    use std::time::Duration;

    fn controller_with(client: MockClient) -> ChatController {
        ChatController::new(AnyCompletionClient::Mock(client))
    }

    async fn next_state(
        rx: &mut mpsc::UnboundedReceiver<ConversationState>,
    ) -> ConversationState {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for a transition")
            .expect("controller dropped")
    }

    #[tokio::test]
    async fn test_idle_to_pending_to_settled() {
        let controller = controller_with(MockClient::with_responses(vec!["Hello!".to_string()]));
        let mut rx = controller.subscribe();

        assert_eq!(controller.state(), ConversationState::Idle);

        controller.send_message("Hi");

        let pending = next_state(&mut rx).await;
        assert!(pending.is_pending());
        assert_eq!(pending.history().len(), 1);
        assert_eq!(pending.history()[0].text, "Hi");
        assert!(pending.history()[0].is_user);

        let settled = next_state(&mut rx).await;
        match &settled {
            ConversationState::Settled { history } => {
                assert_eq!(history.len(), 2);
                assert_eq!(history[1].text, "Hello!");
                assert!(!history[1].is_user);
            }
            other => panic!("expected Settled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_grows_two_per_exchange() {
        let controller = controller_with(MockClient::with_responses(vec![
            "one".to_string(),
            "two".to_string(),
            "three".to_string(),
        ]));
        let mut rx = controller.subscribe();

        for i in 0..3 {
            controller.send_message(&format!("question {}", i));
            let _pending = next_state(&mut rx).await;
            let resolved = next_state(&mut rx).await;
            assert_eq!(resolved.history().len(), 2 * (i + 1));
        }

        let history = controller.state().history().to_vec();
        assert_eq!(history.len(), 6);
        for (i, message) in history.iter().enumerate() {
            assert_eq!(message.is_user, i % 2 == 0);
        }
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_empty_input_is_a_noop() {
        let controller = controller_with(MockClient::new());
        let mut rx = controller.subscribe();

        controller.send_message("");
        controller.send_message("   ");
        controller.send_message("\n\t");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(controller.state(), ConversationState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_whitespace_padding_preserved() {
        let controller = controller_with(MockClient::new());
        let mut rx = controller.subscribe();

        controller.send_message("  hi there  ");

        let pending = next_state(&mut rx).await;
        assert_eq!(pending.history()[0].text, "  hi there  ");
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message() {
        let controller = controller_with(MockClient::with_outcomes(vec![Err(
            ServiceError::network("timeout"),
        )]));
        let mut rx = controller.subscribe();

        controller.send_message("Hi");
        let _pending = next_state(&mut rx).await;

        let failed = next_state(&mut rx).await;
        match &failed {
            ConversationState::Failed { history, error } => {
                assert_eq!(history.len(), 1);
                assert!(history[0].is_user);
                assert!(!error.is_empty());
                assert!(error.contains("timeout"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_settled_then_failed_scenario() {
        let controller = controller_with(MockClient::with_outcomes(vec![
            Ok("Hello!".to_string()),
            Err(ServiceError::network("timeout")),
        ]));
        let mut rx = controller.subscribe();

        controller.send_message("Hi");
        let _pending = next_state(&mut rx).await;
        let _settled = next_state(&mut rx).await;

        controller.send_message("Tell me more");
        let _pending = next_state(&mut rx).await;
        let failed = next_state(&mut rx).await;

        match &failed {
            ConversationState::Failed { history, error } => {
                let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
                assert_eq!(texts, vec!["Hi", "Hello!", "Tell me more"]);
                assert!(error.contains("timeout"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }

        // Retry by clearing, per the last scenario in the walkthrough.
        controller.clear_chat();
        assert_eq!(next_state(&mut rx).await, ConversationState::Idle);
        assert!(controller.state().history().is_empty());
    }

    #[tokio::test]
    async fn test_clear_while_pending_discards_late_result() {
        let controller = controller_with(
            MockClient::with_responses(vec!["too late".to_string()])
                .with_delay(Duration::from_millis(50)),
        );
        let mut rx = controller.subscribe();

        controller.send_message("Hi");
        let pending = next_state(&mut rx).await;
        assert!(pending.is_pending());

        controller.clear_chat();
        assert_eq!(next_state(&mut rx).await, ConversationState::Idle);

        // Let the in-flight completion resolve; it must not reappear.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(controller.state(), ConversationState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_newer_send_supersedes_older() {
        let controller = controller_with(
            MockClient::with_responses(vec!["reply".to_string()])
                .with_delay(Duration::from_millis(50)),
        );
        let mut rx = controller.subscribe();

        controller.send_message("one");
        controller.send_message("two");

        let first = next_state(&mut rx).await;
        assert_eq!(first.history().len(), 1);
        let second = next_state(&mut rx).await;
        assert_eq!(second.history().len(), 2);
        assert!(second.is_pending());

        // Only the newer request's result lands; the older one is stale.
        let settled = next_state(&mut rx).await;
        match &settled {
            ConversationState::Settled { history } => {
                let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
                assert_eq!(texts, vec!["one", "two", "reply"]);
            }
            other => panic!("expected Settled, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_affect_state() {
        let controller = controller_with(MockClient::with_responses(vec!["ok".to_string()]));

        let dropped = controller.subscribe();
        drop(dropped);
        let mut rx = controller.subscribe();

        controller.send_message("Hi");
        let _pending = next_state(&mut rx).await;
        let settled = next_state(&mut rx).await;
        assert_eq!(settled.history().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_from_every_state() {
        let controller = controller_with(MockClient::with_outcomes(vec![
            Ok("Hello!".to_string()),
            Err(ServiceError::remote("500")),
        ]));
        let mut rx = controller.subscribe();

        // From Idle.
        controller.clear_chat();
        assert_eq!(next_state(&mut rx).await, ConversationState::Idle);

        // From Settled.
        controller.send_message("Hi");
        let _pending = next_state(&mut rx).await;
        let _settled = next_state(&mut rx).await;
        controller.clear_chat();
        assert_eq!(next_state(&mut rx).await, ConversationState::Idle);

        // From Failed.
        controller.send_message("again");
        let _pending = next_state(&mut rx).await;
        let failed = next_state(&mut rx).await;
        assert!(failed.error().is_some());
        controller.clear_chat();
        assert_eq!(next_state(&mut rx).await, ConversationState::Idle);
        assert!(controller.state().history().is_empty());
    }
}
