//! Session state and the login/logout flow.
//!
//! The controller owns the authenticated/unauthenticated state the UI routes
//! on. Network work runs in spawned tasks and reports back over oneshot
//! channels polled from the frame loop, so the UI never blocks on the
//! backend.

pub mod session;

pub use session::SessionStore;

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::api::ApiClient;

/// Authentication state the app gates navigation on.
///
/// `Unknown` only exists between startup and the first session-store read;
/// there is no automatic transition on token expiry. A stale token surfaces
/// as an ordinary request error later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

pub struct AuthController {
    api: ApiClient,
    store: SessionStore,
    session_minutes: u32,
    state: AuthState,
    last_error: Option<String>,
    startup_check: Option<oneshot::Receiver<bool>>,
    login_inflight: Option<oneshot::Receiver<Result<(), String>>>,
}

impl AuthController {
    pub fn new(api: ApiClient, store: SessionStore, session_minutes: u32) -> Self {
        Self {
            api,
            store,
            session_minutes,
            state: AuthState::Unknown,
            last_error: None,
            startup_check: None,
            login_inflight: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn is_busy(&self) -> bool {
        self.login_inflight.is_some() || self.startup_check.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Checks once at startup whether a token is stored. Presence is all
    /// that is checked; no validity probe.
    pub fn begin_startup_check(&mut self) {
        let (tx, rx) = oneshot::channel();
        self.startup_check = Some(rx);
        let api = self.api.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            let token = store.load().await;
            let authenticated = token.is_some();
            api.set_token(token).await;
            let _ = tx.send(authenticated);
        });
    }

    /// Validates the form locally, then signs in against the backend.
    /// Failures leave the state unauthenticated and surface one message.
    pub fn begin_login(&mut self, identifier: &str, secret: &str) {
        if self.login_inflight.is_some() {
            return;
        }
        if let Err(message) = validate_credentials(identifier, secret) {
            self.last_error = Some(message.to_string());
            return;
        }
        self.last_error = None;

        let (tx, rx) = oneshot::channel();
        self.login_inflight = Some(rx);
        let api = self.api.clone();
        let store = self.store.clone();
        let identifier = identifier.trim().to_string();
        let secret = secret.to_string();
        let session_minutes = self.session_minutes;
        tokio::spawn(async move {
            let result = async {
                let token = api
                    .sign_in(&identifier, &secret, session_minutes)
                    .await
                    .map_err(|e| e.to_string())?;
                if let Err(e) = store.store(&token).await {
                    warn!("Signed in but could not persist the session: {}", e);
                }
                api.set_token(Some(token)).await;
                Ok(())
            }
            .await;
            let _ = tx.send(result);
        });
    }

    /// Flips to unauthenticated immediately; the remote sign-out and token
    /// removal run best-effort in the background. Logout never fails.
    pub fn logout(&mut self) {
        self.state = AuthState::Unauthenticated;
        self.last_error = None;
        let api = self.api.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            api.sign_out().await;
            store.clear().await;
            api.set_token(None).await;
            info!("Logged out");
        });
    }

    /// Drains finished background work; called once per frame.
    pub fn poll(&mut self) {
        if let Some(rx) = &mut self.startup_check {
            match rx.try_recv() {
                Ok(authenticated) => {
                    self.startup_check = None;
                    self.state = if authenticated {
                        AuthState::Authenticated
                    } else {
                        AuthState::Unauthenticated
                    };
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.startup_check = None;
                    self.state = AuthState::Unauthenticated;
                }
            }
        }

        if let Some(rx) = &mut self.login_inflight {
            match rx.try_recv() {
                Ok(Ok(())) => {
                    self.login_inflight = None;
                    self.state = AuthState::Authenticated;
                    info!("Signed in");
                }
                Ok(Err(message)) => {
                    self.login_inflight = None;
                    self.state = AuthState::Unauthenticated;
                    self.last_error = Some(message);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.login_inflight = None;
                    self.state = AuthState::Unauthenticated;
                    self.last_error = Some("Sign-in task failed".to_string());
                }
            }
        }
    }
}

fn validate_credentials(identifier: &str, secret: &str) -> Result<(), &'static str> {
    if identifier.trim().is_empty() {
        return Err("Email or username is required");
    }
    if secret.is_empty() {
        return Err("Password is required");
    }
    if secret.len() < 6 {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn controller() -> (AuthController, tempfile::TempDir) {
        let dir = tempdir().expect("tempdir");
        let store = SessionStore::at(dir.path().join("session.toml"));
        let api = ApiClient::new("http://127.0.0.1:1".to_string());
        (AuthController::new(api, store, 170), dir)
    }

    #[tokio::test]
    async fn empty_identifier_fails_without_a_network_call() {
        let (mut auth, _dir) = controller();
        auth.begin_login("", "longenough");
        assert!(auth.login_inflight.is_none());
        assert_eq!(auth.last_error(), Some("Email or username is required"));
        assert_ne!(auth.state(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn short_password_fails_without_a_network_call() {
        let (mut auth, _dir) = controller();
        auth.begin_login("amara", "short");
        assert!(auth.login_inflight.is_none());
        assert_eq!(
            auth.last_error(),
            Some("Password must be at least 6 characters")
        );
    }

    async fn drain(auth: &mut AuthController) {
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            auth.poll();
            if !auth.is_busy() {
                return;
            }
        }
        panic!("background work never finished");
    }

    #[tokio::test]
    async fn startup_check_without_a_token_lands_unauthenticated() {
        let (mut auth, _dir) = controller();
        auth.begin_startup_check();
        drain(&mut auth).await;
        assert_eq!(auth.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn startup_check_with_a_stored_token_lands_authenticated() {
        let (mut auth, _dir) = controller();
        auth.store.store("opaque").await.expect("store");
        auth.begin_startup_check();
        drain(&mut auth).await;
        assert_eq!(auth.state(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn failed_sign_in_never_authenticates() {
        // Port 1 refuses connections, so the sign-in ends in a network error.
        let (mut auth, _dir) = controller();
        auth.begin_login("amara", "longenough");
        drain(&mut auth).await;
        assert_eq!(auth.state(), AuthState::Unauthenticated);
        assert!(auth.last_error().is_some());
    }

    #[tokio::test]
    async fn logout_is_unconditional() {
        let (mut auth, _dir) = controller();
        auth.state = AuthState::Authenticated;
        auth.logout();
        assert_eq!(auth.state(), AuthState::Unauthenticated);
        // A second logout is harmless.
        auth.logout();
        assert_eq!(auth.state(), AuthState::Unauthenticated);
    }
}
