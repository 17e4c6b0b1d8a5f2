use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::error::ApiError;
use super::models::Connection;

const SIGN_IN_PATH: &str = "/auth/signin";
const SIGN_OUT_PATH: &str = "/auth/signout";
const LIST_CONNECTIONS_PATH: &str = "/services/IotConnect/getAllIoTConnections";
const GET_CONNECTION_PATH: &str = "/services/IotConnect/getConnectionById";

/// HTTP client for the backend, shared across screens via cheap clones.
///
/// The bearer token lives behind a lock so sign-in and logout, which run in
/// spawned tasks, update every clone at once.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Signs in and returns the issued bearer token.
    ///
    /// The token is not stored here; the auth controller decides what to do
    /// with it.
    pub async fn sign_in(
        &self,
        identifier: &str,
        secret: &str,
        session_minutes: u32,
    ) -> Result<String, ApiError> {
        let body = json!({
            "username_or_email": identifier,
            "password": secret,
            "session_required": session_minutes,
        });

        let request = self.http.post(self.endpoint(SIGN_IN_PATH)).json(&body);
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(ApiError::Auth(message_from_payload(&payload, status)));
        }
        token_from_payload(&payload)
    }

    /// Best-effort remote sign-out; every failure is swallowed.
    pub async fn sign_out(&self) {
        let request = self.http.post(self.endpoint(SIGN_OUT_PATH));
        match self.authorized(request).await.send().await {
            Ok(response) => debug!("Sign-out returned {}", response.status()),
            Err(e) => debug!("Sign-out request failed (ignored): {}", e),
        }
    }

    /// Fetches all configured connections. A missing, empty or non-array
    /// body normalizes to the empty list rather than an error.
    pub async fn list_connections(&self) -> Result<Vec<Connection>, ApiError> {
        let request = self.http.get(self.endpoint(LIST_CONNECTIONS_PATH));
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;

        if !status.is_success() {
            let payload: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            return Err(ApiError::Fetch(message_from_payload(&payload, status)));
        }
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Fetch(format!("could not decode connection list: {e}")))?;
        Ok(connections_from_payload(payload))
    }

    /// Fetches a single connection by id. A 404 is not treated specially.
    pub async fn get_connection(&self, id: &str) -> Result<Connection, ApiError> {
        let request = self
            .http
            .get(format!("{}/{}", self.endpoint(GET_CONNECTION_PATH), id));
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let payload: Value = response.json().await.unwrap_or(Value::Null);
            return Err(ApiError::Fetch(message_from_payload(&payload, status)));
        }
        response
            .json::<Connection>()
            .await
            .map_err(|e| ApiError::Fetch(format!("could not decode connection: {e}")))
    }
}

/// Extracts the token from a successful sign-in body; a body without one is
/// itself a sign-in failure.
fn token_from_payload(payload: &Value) -> Result<String, ApiError> {
    match payload.get("token").and_then(Value::as_str) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::Auth("Invalid response from server".to_string())),
    }
}

/// Pulls the server's `message` field out of an error body, falling back to
/// the status line.
fn message_from_payload(payload: &Value, status: StatusCode) -> String {
    payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("server returned {status}"))
}

/// Normalizes the list body: anything but an array is the empty list, and
/// records that do not decode are skipped with a warning.
fn connections_from_payload(payload: Value) -> Vec<Connection> {
    let Value::Array(items) = payload else {
        warn!("Connection list body was not an array, treating as empty");
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Connection>(item) {
            Ok(connection) => Some(connection),
            Err(e) => {
                warn!("Skipping undecodable connection record: {}", e);
                None
            }
        })
        .collect()
}
