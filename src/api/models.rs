use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

/// One configured broker connection as the backend reports it.
///
/// Owned and mutated exclusively by the backend; this app only reads a copy
/// for the duration of a screen visit. Everything beyond the identifier and
/// name is optional so a sparse record still renders.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Connection {
    pub connection_id: String,
    pub connection_name: String,
    // Wire field name is the backend's spelling.
    #[serde(rename = "connection_discription", default)]
    pub connection_description: Option<String>,
    #[serde(default)]
    pub connection_url: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub typeof_connection: Option<String>,
    #[serde(default)]
    pub ping_status: Option<bool>,
    #[serde(default)]
    pub authenticated_broker: Option<bool>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub keep_alive: Option<u64>,
    #[serde(default)]
    pub qos: Option<u8>,
    #[serde(default)]
    pub subscribe_topic: Option<String>,
    #[serde(default)]
    pub response_parameters: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Connection {
    /// Creation date formatted for display ("June 5, 2025"), when the
    /// backend timestamp parses; otherwise the raw string is shown as-is.
    pub fn created_at_display(&self) -> Option<String> {
        let raw = self.created_at.as_deref()?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.format("%B %-d, %Y").to_string());
        }
        let date_prefix = raw.get(..10).unwrap_or(raw);
        if let Ok(parsed) = NaiveDate::parse_from_str(date_prefix, "%Y-%m-%d") {
            return Some(parsed.format("%B %-d, %Y").to_string());
        }
        Some(raw.to_string())
    }

    /// Broker credentials are never displayed in plaintext.
    pub fn masked_password(&self) -> &'static str {
        "••••••••"
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}
