//! Wiring of one credential store and one gateway into the session, task and
//! chat components.

use std::sync::Arc;

use credential_store::{CredentialStore, FileCredentialStore};
use taskdeck_api::{ApiError, Gateway};

use crate::chat::ChatTracker;
use crate::config::ClientConfig;
use crate::session::SessionManager;
use crate::tasks::TaskSync;

/// Shared handles for every component of a client process.
#[derive(Clone)]
pub struct TaskdeckClient {
    store: Arc<dyn CredentialStore>,
    gateway: Gateway,
}

impl std::fmt::Debug for TaskdeckClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskdeckClient")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl TaskdeckClient {
    /// File-backed credentials at `config.credential_path`, `reqwest` transport.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(config.credential_path.clone()));
        let gateway = Gateway::new(config.api.clone(), Arc::clone(&store))?;
        tracing::debug!(
            base_url = %config.api.base_url,
            credential_path = %config.credential_path.display(),
            "client configured"
        );
        Ok(Self { store, gateway })
    }

    /// `gateway` must read credentials from `store`.
    pub fn with_parts(store: Arc<dyn CredentialStore>, gateway: Gateway) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> SessionManager {
        SessionManager::new(Arc::clone(&self.store), self.gateway.clone())
    }

    /// Fresh, empty task collection. Keep one per owner.
    pub fn tasks(&self) -> TaskSync {
        TaskSync::new(self.gateway.clone())
    }

    /// Fresh conversation with no bound id.
    pub fn chat(&self) -> ChatTracker {
        ChatTracker::new(self.gateway.clone(), Arc::clone(&self.store))
    }
}
