use std::collections::BTreeMap;

use credential_store::Credential;

use crate::config::ApiConfig;
use crate::request::RequestBody;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_IF_MATCH: &str = "if-match";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Build a deterministic header map for one request.
///
/// `authorization` is present only when a credential is supplied, so endpoints
/// that allow anonymous calls (login, registration) pass through untouched.
pub fn build_headers(
    config: &ApiConfig,
    credential: Option<&Credential>,
    body: &RequestBody,
) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ACCEPT.to_owned(), CONTENT_TYPE_JSON.to_owned());
    let content_type = match body {
        RequestBody::Form(_) => CONTENT_TYPE_FORM,
        RequestBody::None | RequestBody::Json(_) => CONTENT_TYPE_JSON,
    };
    headers.insert(HEADER_CONTENT_TYPE.to_owned(), content_type.to_owned());

    let user_agent = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    if let Some(credential) = credential {
        headers.insert(
            HEADER_AUTHORIZATION.to_owned(),
            credential.bearer_header_value(),
        );
    }

    headers
}

/// Entity tag sent with task mutations when the local copy carries a revision.
pub fn revision_tag(revision: u64) -> String {
    format!("\"{revision}\"")
}

pub fn default_user_agent() -> String {
    format!("taskdeck/{}", env!("CARGO_PKG_VERSION"))
}
