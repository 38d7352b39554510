use pretty_assertions::assert_eq;
use taskdeck::{
    ApiConfig, ClientConfig, ConversationState, Credential, CredentialStore, SessionState, TaskFilter,
    TaskdeckClient,
};
use tempfile::tempdir;

#[tokio::test]
async fn client_from_config_uses_file_store_at_configured_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("taskdeck").join("credentials.json");
    let config = ClientConfig::default()
        .with_api(ApiConfig::new("http://127.0.0.1:9/api/v1"))
        .with_credential_path(&path);

    let client = TaskdeckClient::from_config(&config).expect("client");
    client
        .store()
        .store(&Credential::new("persisted").expect("credential"))
        .expect("store");

    assert!(path.exists());
    assert!(client.session().has_credential());

    client.session().logout().expect("logout");
    assert!(!path.exists());
}

#[tokio::test]
async fn fresh_components_start_empty() {
    let dir = tempdir().expect("tempdir");
    let config = ClientConfig::default()
        .with_api(ApiConfig::new("http://127.0.0.1:9/api/v1"))
        .with_credential_path(dir.path().join("credentials.json"));
    let client = TaskdeckClient::from_config(&config).expect("client");

    let state = client.session().resolve_session().await.expect("resolve");
    assert_eq!(state, SessionState::Unauthenticated);
    assert!(client.tasks().tasks().is_empty());
    assert_eq!(client.tasks().active_filter(), TaskFilter::All);
    assert_eq!(client.chat().conversation(), ConversationState::NoConversation);
}
