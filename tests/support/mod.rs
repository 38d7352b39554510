#![allow(dead_code)]

use std::sync::Arc;

use taskdeck::{ApiConfig, Credential, CredentialStore, Gateway, MemoryCredentialStore};
use taskdeck_api::Transport;
use taskdeck_api_mock::ScriptedTransport;

pub const BASE_URL: &str = "https://tasks.example.com/api/v1";

/// Store, scripted transport and a gateway wired to both.
pub struct Harness {
    pub store: Arc<MemoryCredentialStore>,
    pub transport: Arc<ScriptedTransport>,
    pub gateway: Gateway,
}

impl Harness {
    pub fn new(token: Option<&str>) -> Self {
        Self::with_transport(token, ScriptedTransport::new())
    }

    pub fn with_transport(token: Option<&str>, transport: ScriptedTransport) -> Self {
        let store = Arc::new(match token {
            Some(token) => {
                MemoryCredentialStore::with_credential(Credential::new(token).expect("credential"))
            }
            None => MemoryCredentialStore::new(),
        });
        let transport = Arc::new(transport);
        let gateway = Gateway::with_transport(
            ApiConfig::new(BASE_URL),
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Arc::clone(&transport) as Arc<dyn Transport>,
        );
        Self {
            store,
            transport,
            gateway,
        }
    }

    pub fn store_handle(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.store) as Arc<dyn CredentialStore>
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store
            .load()
            .expect("load credential")
            .map(|credential| credential.expose().to_owned())
    }
}
