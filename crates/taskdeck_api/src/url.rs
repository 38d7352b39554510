/// Default base URL for taskdeck API requests.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const IDENTITY_PATH: &str = "/auth/me";
pub const CHAT_PATH: &str = "/chat";
pub const PROFILE_PATH: &str = "/users/profile";

/// Trim a configured base URL, falling back to the default when blank.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_API_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Join an endpoint path onto a base URL with exactly one separating slash.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    let base = normalize_base_url(base_url);
    let path = endpoint.trim().trim_start_matches('/');
    if path.is_empty() {
        return base;
    }
    format!("{base}/{path}")
}

pub fn tasks_path(owner_id: i64) -> String {
    format!("/{owner_id}/tasks")
}

pub fn task_path(owner_id: i64, task_id: i64) -> String {
    format!("/{owner_id}/tasks/{task_id}")
}

pub fn task_completion_path(owner_id: i64, task_id: i64) -> String {
    format!("/{owner_id}/tasks/{task_id}/complete")
}
