use thiserror::Error;

/// Failures surfaced by the REST gateway, one user-facing message each.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server could not be reached at all.
    #[error("Unable to connect to the server. Please check if the server is running and accessible.")]
    Network,

    /// Sign-in was rejected or the sign-in response was unusable.
    #[error("Sign-in failed: {0}")]
    Auth(String),

    /// Any other non-2xx response or undecodable body.
    #[error("Request failed: {0}")]
    Fetch(String),
}

impl ApiError {
    /// Maps a transport-level error, keeping unreachable-server distinct.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::Network
        } else {
            ApiError::Fetch(err.to_string())
        }
    }
}
