//! Deterministic scripted implementation of the `taskdeck_api` transport seam.
//!
//! Replies are consumed in FIFO order and every request is recorded, so tests
//! can assert both what went over the wire and that nothing did.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};
use taskdeck_api::{ApiError, HttpRequest, HttpResponse, RequestBody, Transport};

/// One scripted outcome for the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Respond(HttpResponse),
    TransportFailure(String),
    Timeout,
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    requests: Vec<HttpRequest>,
}

/// Scripted transport used by contract tests.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
    yield_before_reply: bool,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend once inside every `send`, so a concurrently polled caller
    /// observes the request as in flight.
    #[must_use]
    pub fn yielding() -> Self {
        Self {
            yield_before_reply: true,
            ..Self::default()
        }
    }

    pub fn push(&self, reply: ScriptedReply) {
        lock_unpoisoned(&self.state).replies.push_back(reply);
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(ScriptedReply::Respond(HttpResponse::new(
            status,
            body.to_string(),
        )));
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.push(ScriptedReply::Respond(HttpResponse::new(status, body)));
    }

    pub fn push_no_content(&self) {
        self.push(ScriptedReply::Respond(HttpResponse::no_content()));
    }

    /// Error response carrying the authority's `{"detail": ...}` shape.
    pub fn push_detail(&self, status: u16, detail: &str) {
        self.push_json(status, json!({ "detail": detail }));
    }

    pub fn push_transport_failure(&self, message: &str) {
        self.push(ScriptedReply::TransportFailure(message.to_owned()));
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        lock_unpoisoned(&self.state).requests.len()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock_unpoisoned(&self.state).requests.clone()
    }

    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock_unpoisoned(&self.state).requests.last().cloned()
    }

    #[must_use]
    pub fn pending_replies(&self) -> usize {
        lock_unpoisoned(&self.state).replies.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let reply = {
            let mut state = lock_unpoisoned(&self.state);
            state.requests.push(request);
            state.replies.pop_front()
        };

        if self.yield_before_reply {
            tokio::task::yield_now().await;
        }

        match reply {
            Some(ScriptedReply::Respond(response)) => Ok(response),
            Some(ScriptedReply::TransportFailure(message)) => Err(ApiError::Transport(message)),
            Some(ScriptedReply::Timeout) => Err(ApiError::Timeout),
            None => Ok(HttpResponse::new(
                500,
                json!({ "detail": "unexpected request" }).to_string(),
            )),
        }
    }
}

/// JSON body of a recorded request, if it carried one.
#[must_use]
pub fn json_body(request: &HttpRequest) -> Option<&Value> {
    match &request.body {
        RequestBody::Json(value) => Some(value),
        _ => None,
    }
}

/// Server-shaped task JSON.
#[must_use]
pub fn task_json(id: i64, owner_id: i64, title: &str, completed: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "completed": completed,
        "priority": "medium",
        "due_date": null,
        "category_id": null,
        "category": null,
        "created_at": "2026-10-01T09:00:00",
        "updated_at": "2026-10-01T09:00:00",
        "user_id": owner_id
    })
}

/// Server-shaped identity JSON.
#[must_use]
pub fn identity_json(id: i64, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "full_name": null,
        "created_at": "2026-01-01T00:00:00"
    })
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
