//! Assistant conversation: an append-only transcript plus the server-issued
//! conversation id.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use credential_store::CredentialStore;
use taskdeck_api::{ChatRequest, Gateway};

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Authentication token is missing. Please log in again.";

const FAILED_RESPONSE_PREFIX: &str = "Failed to get response";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnRole {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Error, content)
    }

    fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Moves one way only: the first reply carrying an id binds the tracker to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    NoConversation,
    InConversation(i64),
}

impl ConversationState {
    pub fn conversation_id(self) -> Option<i64> {
        match self {
            Self::NoConversation => None,
            Self::InConversation(id) => Some(id),
        }
    }
}

/// First cause found, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyMessage,
    /// Another send is still awaiting its reply.
    Busy,
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Replied,
    /// An error turn carrying the failure message was appended.
    Failed,
    Rejected(RejectReason),
}

#[derive(Debug, Default)]
struct ChatState {
    transcript: Vec<ConversationTurn>,
    conversation: ConversationState,
    in_flight: bool,
}

/// One conversation thread. Overlapping sends are rejected, not queued, so
/// turns land in call order.
pub struct ChatTracker {
    gateway: Gateway,
    store: Arc<dyn CredentialStore>,
    state: Mutex<ChatState>,
}

impl fmt::Debug for ChatTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock_unpoisoned(&self.state);
        f.debug_struct("ChatTracker")
            .field("turns", &state.transcript.len())
            .field("conversation", &state.conversation)
            .field("in_flight", &state.in_flight)
            .finish_non_exhaustive()
    }
}

impl ChatTracker {
    pub fn new(gateway: Gateway, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            gateway,
            store,
            state: Mutex::new(ChatState::default()),
        }
    }

    pub fn transcript(&self) -> Vec<ConversationTurn> {
        lock_unpoisoned(&self.state).transcript.clone()
    }

    pub fn conversation(&self) -> ConversationState {
        lock_unpoisoned(&self.state).conversation
    }

    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation().conversation_id()
    }

    pub fn is_sending(&self) -> bool {
        lock_unpoisoned(&self.state).in_flight
    }

    /// Send `message` to the assistant.
    ///
    /// The user turn is appended before the request goes out. Failures never
    /// surface as `Err`; they become error turns in the transcript.
    pub async fn send(&self, message: &str) -> SendOutcome {
        let conversation_id = {
            let mut state = lock_unpoisoned(&self.state);
            let authenticated = self.store.is_present();
            let rejection = if message.trim().is_empty() {
                Some(RejectReason::EmptyMessage)
            } else if state.in_flight {
                Some(RejectReason::Busy)
            } else if !authenticated {
                Some(RejectReason::Unauthenticated)
            } else {
                None
            };

            if let Some(reason) = rejection {
                // A missing credential is always reported, whatever else blocked the send.
                if !authenticated {
                    state
                        .transcript
                        .push(ConversationTurn::error(MISSING_CREDENTIAL_MESSAGE));
                }
                tracing::debug!(?reason, "chat send rejected");
                return SendOutcome::Rejected(reason);
            }

            state.transcript.push(ConversationTurn::user(message));
            state.in_flight = true;
            state.conversation.conversation_id()
        };
        let _in_flight = InFlight(&self.state);

        let request = ChatRequest {
            message: message.to_owned(),
            conversation_id,
        };
        let result = self.gateway.send_chat(&request).await;

        let mut state = lock_unpoisoned(&self.state);
        match result {
            Ok(reply) => {
                state.transcript.push(ConversationTurn::assistant(reply.response));
                match (state.conversation, reply.conversation_id) {
                    (ConversationState::NoConversation, Some(id)) => {
                        tracing::info!(conversation_id = id, "conversation started");
                        state.conversation = ConversationState::InConversation(id);
                    }
                    (ConversationState::InConversation(bound), Some(id)) if bound != id => {
                        tracing::warn!(
                            conversation_id = bound,
                            received = id,
                            "ignoring conversation id change"
                        );
                    }
                    _ => {}
                }
                SendOutcome::Replied
            }
            Err(error) => {
                tracing::warn!(status = ?error.status(), %error, "chat send failed");
                state.transcript.push(ConversationTurn::error(format!(
                    "{FAILED_RESPONSE_PREFIX}: {}",
                    error.message()
                )));
                SendOutcome::Failed
            }
        }
    }
}

/// Clears the in-flight flag even if the send future is dropped mid-request.
struct InFlight<'a>(&'a Mutex<ChatState>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock_unpoisoned(self.0).in_flight = false;
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
