//! Credential lifecycle: bootstrap, login, registration and logout.

use std::fmt;
use std::sync::Arc;

use credential_store::{Credential, CredentialStore};
use taskdeck_api::{Gateway, Identity, ProfileUpdate, RegisterRequest, TokenResponse};

use crate::error::{AuthError, SessionError};

/// Message used when the authority answers a login with a blank token.
pub const EMPTY_TOKEN_MESSAGE: &str = "authority returned an empty access token";

/// Outcome of [`SessionManager::resolve_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(Identity),
    /// The caller must send the user to sign-in.
    Unauthenticated,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Owns writes to the credential store. Validity is confirmed by the
/// authority on every bootstrap; the token itself is never inspected.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    gateway: Gateway,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("gateway", &self.gateway)
            .field("has_credential", &self.store.is_present())
            .finish()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, gateway: Gateway) -> Self {
        Self { store, gateway }
    }

    /// Resolve the identity behind the stored credential.
    ///
    /// Any rejection by the authority, including a transport failure, clears
    /// the stored credential and yields [`SessionState::Unauthenticated`].
    pub async fn resolve_session(&self) -> Result<SessionState, SessionError> {
        let Some(credential) = self.store.load()? else {
            tracing::debug!("no stored credential");
            return Ok(SessionState::Unauthenticated);
        };

        match self.gateway.current_identity(&credential).await {
            Ok(identity) => {
                tracing::info!(user_id = identity.id, "session resolved");
                Ok(SessionState::Authenticated(identity))
            }
            Err(error) => {
                tracing::warn!(
                    status = ?error.status(),
                    %error,
                    "stored credential rejected, clearing session"
                );
                self.store.clear()?;
                Ok(SessionState::Unauthenticated)
            }
        }
    }

    /// Exchange `email`/`password` for a credential and store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, AuthError> {
        let token = self.gateway.login(email, password).await?;
        let credential = self.persist(token)?;
        tracing::info!("login succeeded");
        Ok(credential)
    }

    /// Create an account; the authority signs the new user in immediately.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<Credential, AuthError> {
        let request = RegisterRequest {
            email: email.to_owned(),
            password: password.to_owned(),
            full_name: full_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
        };
        let token = self.gateway.register(&request).await?;
        let credential = self.persist(token)?;
        tracing::info!("registration succeeded");
        Ok(credential)
    }

    /// Change the signed-in user's display name. The stored credential is
    /// left alone whatever the outcome.
    pub async fn update_profile(&self, full_name: &str) -> Result<Identity, AuthError> {
        let request = ProfileUpdate {
            full_name: full_name.trim().to_owned(),
        };
        let identity = self.gateway.update_profile(&request).await?;
        tracing::info!(user_id = identity.id, "profile updated");
        Ok(identity)
    }

    /// Idempotent.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    pub fn has_credential(&self) -> bool {
        self.store.is_present()
    }

    fn persist(&self, token: TokenResponse) -> Result<Credential, AuthError> {
        let credential = Credential::new(token.access_token)
            .ok_or_else(|| AuthError::new(EMPTY_TOKEN_MESSAGE, None))?;
        self.store.store(&credential)?;
        Ok(credential)
    }
}
