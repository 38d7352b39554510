//! Client-side core of taskdeck: session lifecycle, owner-scoped task
//! synchronization and assistant conversations over the taskdeck HTTP API.
//!
//! # Public API Overview
//! - [`SessionManager`] resolves the stored credential into an [`Identity`] and owns
//!   login, registration and logout.
//! - [`TaskSync`] keeps one owner's task collection in step with the authority.
//! - [`ChatTracker`] runs one assistant conversation thread.
//! - [`TaskdeckClient`] wires a credential store and a [`Gateway`] into all three.
//!
//! Remote calls go through [`taskdeck_api::Gateway`]; credentials live in a
//! [`credential_store::CredentialStore`].

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod tasks;

pub use crate::chat::{
    ChatTracker, ConversationState, ConversationTurn, RejectReason, SendOutcome, TurnRole,
    MISSING_CREDENTIAL_MESSAGE,
};
pub use crate::client::TaskdeckClient;
pub use crate::config::{default_credential_path, ClientConfig, LoggingConfig};
pub use crate::error::{AuthError, ConfigError, SessionError, SyncError, UnknownFilter};
pub use crate::logging::{init_logging, DEFAULT_LOG_FILTER};
pub use crate::session::{SessionManager, SessionState};
pub use crate::tasks::{TaskFilter, TaskSync};

pub use credential_store::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use taskdeck_api::{ApiConfig, ApiError, Gateway, Identity, Task, TaskDraft, TaskPriority};
