use std::path::{Path, PathBuf};

/// Directory created under the platform data root.
pub const CREDENTIAL_DIR: &str = "taskdeck";
pub const CREDENTIAL_FILE_NAME: &str = "credentials.json";
/// The single well-known key the token is stored under.
pub const TOKEN_KEY: &str = "token";

#[must_use]
pub fn credential_path(data_root: &Path) -> PathBuf {
    data_root.join(CREDENTIAL_DIR).join(CREDENTIAL_FILE_NAME)
}

pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| CREDENTIAL_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}
