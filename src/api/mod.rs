//! REST gateway client for the IoT Connect backend.
//!
//! One configured origin, three operations: sign-in, list connections and
//! fetch a single connection by id. Every call attaches the bearer token when
//! one is present and maps transport and server failures to a single
//! user-facing message, with an unreachable server kept distinct from other
//! failures. Response bodies are decoded leniently; the backend owns the
//! schema and this client never validates it.

pub mod client;
pub mod error;
pub mod models;

pub use client::ApiClient;
pub use error::ApiError;
pub use models::Connection;
