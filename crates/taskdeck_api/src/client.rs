use std::fmt;
use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use credential_store::{Credential, CredentialStore};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{parse_error_message, ApiError};
use crate::headers::{build_headers, revision_tag, HEADER_IF_MATCH};
use crate::payload::{
    ChatReply, ChatRequest, Identity, ProfileUpdate, RegisterRequest, Task, TaskChanges,
    TaskDraft, TaskQuery, TokenResponse,
};
use crate::request::{ApiRequest, RequestBody};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::url::{
    endpoint_url, task_completion_path, task_path, tasks_path, CHAT_PATH, IDENTITY_PATH,
    LOGIN_PATH, PROFILE_PATH, REGISTER_PATH,
};

/// Optional cancellation signal shared with in-flight requests.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// No-content response. Callers expecting a payload treat this as an error.
    Empty,
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Authenticated request executor shared by every remote-facing component.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    config: ApiConfig,
    cancellation: Option<CancellationSignal>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Gateway over the default `reqwest` transport.
    pub fn new(config: ApiConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, credentials, Arc::new(transport)))
    }

    pub fn with_transport(
        config: ApiConfig,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            credentials,
            config,
            cancellation: None,
        }
    }

    /// Every request issued through this gateway aborts with
    /// [`ApiError::Cancelled`] once `signal` is set.
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Execute `method endpoint` with the stored credential, if any.
    pub async fn execute(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Payload, ApiError> {
        let mut request = ApiRequest::new(method, endpoint);
        if let Some(body) = body {
            request = request.with_json(body);
        }
        self.send(request).await
    }

    /// Execute a prepared request with the stored credential, if any.
    pub async fn send(&self, request: ApiRequest) -> Result<Payload, ApiError> {
        let credential = self.credentials.load()?;
        self.dispatch(request, credential.as_ref()).await
    }

    /// Execute a prepared request with an explicit credential (or none),
    /// bypassing the store.
    pub async fn send_as(
        &self,
        request: ApiRequest,
        credential: Option<&Credential>,
    ) -> Result<Payload, ApiError> {
        self.dispatch(request, credential).await
    }

    pub async fn send_json<T>(&self, request: ApiRequest) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let endpoint = request.endpoint.clone();
        let payload = self.send(request).await?;
        decode_payload(&endpoint, payload)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).with_form([
            ("username".to_owned(), email.to_owned()),
            ("password".to_owned(), password.to_owned()),
        ]);
        let payload = self.send_as(request, None).await?;
        decode_payload(LOGIN_PATH, payload)
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).with_json(to_value(REGISTER_PATH, body)?);
        let payload = self.send_as(request, None).await?;
        decode_payload(REGISTER_PATH, payload)
    }

    /// Resolve the identity behind `credential`.
    pub async fn current_identity(&self, credential: &Credential) -> Result<Identity, ApiError> {
        let payload = self
            .send_as(ApiRequest::get(IDENTITY_PATH), Some(credential))
            .await?;
        decode_payload(IDENTITY_PATH, payload)
    }

    /// Rename the signed-in user; the authority answers with the updated identity.
    pub async fn update_profile(&self, body: &ProfileUpdate) -> Result<Identity, ApiError> {
        let body = to_value(PROFILE_PATH, body)?;
        self.send_json(ApiRequest::put(PROFILE_PATH).with_json(body))
            .await
    }

    pub async fn list_tasks(&self, owner_id: i64, query: &TaskQuery) -> Result<Vec<Task>, ApiError> {
        let mut request = ApiRequest::get(tasks_path(owner_id));
        for (key, value) in query.pairs() {
            request = request.with_query(key, value);
        }
        self.send_json(request).await
    }

    pub async fn get_task(&self, owner_id: i64, task_id: i64) -> Result<Task, ApiError> {
        self.send_json(ApiRequest::get(task_path(owner_id, task_id)))
            .await
    }

    pub async fn create_task(&self, owner_id: i64, draft: &TaskDraft) -> Result<Task, ApiError> {
        let endpoint = tasks_path(owner_id);
        let body = to_value(&endpoint, draft)?;
        self.send_json(ApiRequest::post(endpoint).with_json(body))
            .await
    }

    pub async fn update_task(
        &self,
        owner_id: i64,
        task_id: i64,
        changes: &TaskChanges,
        revision: Option<u64>,
    ) -> Result<Task, ApiError> {
        let endpoint = task_path(owner_id, task_id);
        let body = to_value(&endpoint, changes)?;
        self.send_json(
            ApiRequest::put(endpoint)
                .with_json(body)
                .with_revision(revision),
        )
        .await
    }

    pub async fn toggle_task(
        &self,
        owner_id: i64,
        task_id: i64,
        revision: Option<u64>,
    ) -> Result<Task, ApiError> {
        self.send_json(
            ApiRequest::patch(task_completion_path(owner_id, task_id)).with_revision(revision),
        )
        .await
    }

    /// Any success counts; the authority may answer 204 or a small acknowledgement body.
    pub async fn delete_task(
        &self,
        owner_id: i64,
        task_id: i64,
        revision: Option<u64>,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(task_path(owner_id, task_id)).with_revision(revision))
            .await
            .map(|_| ())
    }

    pub async fn send_chat(&self, body: &ChatRequest) -> Result<ChatReply, ApiError> {
        let body = to_value(CHAT_PATH, body)?;
        self.send_json(ApiRequest::post(CHAT_PATH).with_json(body))
            .await
    }

    fn request_url(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let url = endpoint_url(&self.config.base_url, &request.endpoint);
        if request.query.is_empty() {
            return Ok(url);
        }

        let mut parsed =
            Url::parse(&url).map_err(|error| ApiError::InvalidUrl(format!("{url}: {error}")))?;
        parsed
            .query_pairs_mut()
            .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(parsed.into())
    }

    async fn dispatch(
        &self,
        request: ApiRequest,
        credential: Option<&Credential>,
    ) -> Result<Payload, ApiError> {
        let url = self.request_url(&request)?;
        let mut headers = build_headers(&self.config, credential, &request.body);
        if let Some(revision) = request.revision {
            headers.insert(HEADER_IF_MATCH.to_owned(), revision_tag(revision));
        }

        let ApiRequest {
            method,
            endpoint,
            body,
            ..
        } = request;
        tracing::debug!(%method, %endpoint, authenticated = credential.is_some(), "api request");

        let http_request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let response =
            await_or_cancel(self.transport.send(http_request), self.cancellation.as_ref())
                .await??;

        if !response.is_success() {
            let message = parse_error_message(&response.body);
            tracing::warn!(%endpoint, status = response.status, %message, "api request rejected");
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        tracing::debug!(%endpoint, status = response.status, "api response");
        if response.is_empty() {
            return Ok(Payload::Empty);
        }

        serde_json::from_str(&response.body)
            .map(Payload::Json)
            .map_err(|error| ApiError::Decode {
                endpoint,
                message: error.to_string(),
            })
    }
}

fn decode_payload<T>(endpoint: &str, payload: Payload) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    match payload {
        Payload::Json(value) => serde_json::from_value(value).map_err(|error| ApiError::Decode {
            endpoint: endpoint.to_owned(),
            message: error.to_string(),
        }),
        Payload::Empty => Err(ApiError::EmptyResponse {
            endpoint: endpoint.to_owned(),
        }),
    }
}

fn to_value<T>(endpoint: &str, body: &T) -> Result<Value, ApiError>
where
    T: serde::Serialize,
{
    serde_json::to_value(body).map_err(|error| ApiError::Decode {
        endpoint: endpoint.to_owned(),
        message: error.to_string(),
    })
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, ApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(ApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(ApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
