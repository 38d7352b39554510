use credential_store::CredentialStoreError;
use taskdeck_api::ApiError;
use thiserror::Error;

/// Login or registration failure, carrying the authority's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
    /// HTTP status when the authority answered.
    pub status: Option<u16>,
}

impl AuthError {
    pub fn new(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        Self::new(error.message(), error.status())
    }
}

impl From<CredentialStoreError> for AuthError {
    fn from(error: CredentialStoreError) -> Self {
        Self::new(error.to_string(), None)
    }
}

/// Failure of a task synchronization operation. The local collection is
/// unchanged whenever one of these is returned.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local precondition on input; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The referenced task is absent from the local collection; nothing was sent.
    #[error("task {task_id} is not in the local collection")]
    NotFound { task_id: i64 },

    /// The authority rejected a write against a stale revision.
    #[error("task {task_id} was changed elsewhere: {message}")]
    Conflict { task_id: i64, message: String },

    #[error("task {task_id} belongs to user {found}, expected user {expected}")]
    OwnerMismatch {
        task_id: i64,
        expected: i64,
        found: i64,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SyncError {
    /// Human-readable message suitable for display.
    pub fn message(&self) -> String {
        match self {
            Self::Api(error) => error.message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task filter '{0}', expected one of all, pending, completed")]
pub struct UnknownFilter(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of seconds, got '{value}'")]
    InvalidTimeout { key: &'static str, value: String },
}

/// Failure to read or clear the stored credential while resolving or ending
/// a session. Authority rejections are not errors here; they yield
/// an unauthenticated session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("credential store unavailable: {0}")]
    Store(#[from] CredentialStoreError),
}
