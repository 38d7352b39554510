//! Authenticated HTTP gateway for the taskdeck service.
//!
//! Every remote call made by the client flows through [`Gateway`]: it attaches
//! the bearer credential when one is stored, normalizes error responses into
//! [`ApiError`] and distinguishes "no content" from payload responses.
//!
//! The HTTP stack sits behind the [`Transport`] trait so session and sync logic
//! can be exercised against scripted transports.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod request;
pub mod transport;
pub mod url;

pub use client::{CancellationSignal, Gateway, Payload};
pub use config::ApiConfig;
pub use error::{parse_error_message, ApiError, FALLBACK_ERROR_MESSAGE};
pub use payload::{
    Category, ChatReply, ChatRequest, Identity, ProfileUpdate, RegisterRequest, Task,
    TaskChanges, TaskDraft, TaskPriority, TaskQuery, TokenResponse,
};
pub use request::{ApiRequest, RequestBody};
pub use reqwest::Method;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use url::{endpoint_url, normalize_base_url, DEFAULT_API_BASE_URL};
