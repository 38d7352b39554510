//! Process-wide slot for the single opaque bearer token of a client session.
//!
//! The token is forwarded, never inspected. Absence of a token means the
//! session is unauthenticated.

mod credential;
mod error;
mod paths;
mod store;

pub use credential::Credential;
pub use error::CredentialStoreError;
pub use paths::{credential_path, CREDENTIAL_DIR, CREDENTIAL_FILE_NAME, TOKEN_KEY};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
