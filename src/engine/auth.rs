// Chatdeck Engine — Auth session
//
// The identity lives here, not in the chat controller: consumers subscribe
// to a watch stream of Option<Identity> and react to sign-in/sign-out the
// same way regardless of where the identity came from (local override or
// the dashboard's login endpoint).

use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::config::EngineConfig;
use chatdeck_core::Identity;
use log::{info, warn};
use serde::Deserialize;
use tokio::sync::watch;

// ── Login endpoint wire types ──────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// "ok" or "error".
    pub result: String,
    pub message: Option<String>,
    pub user: Option<LoginUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Map a decoded login response to an identity, or an auth error carrying
/// whatever the server said.
fn identity_from_response(response: LoginResponse) -> EngineResult<Identity> {
    match response {
        LoginResponse { result, user: Some(user), .. } if result == "ok" => {
            Ok(Identity::new(user.id, user.name).with_email(user.email))
        }
        LoginResponse { message, .. } => Err(EngineError::Auth(
            message.unwrap_or_else(|| "Login failed".into()),
        )),
    }
}

// ── Auth session ───────────────────────────────────────────────────────

pub struct AuthSession {
    config: EngineConfig,
    client: reqwest::Client,
    tx: watch::Sender<Option<Identity>>,
}

impl AuthSession {
    pub fn new(config: EngineConfig) -> Self {
        let (tx, _rx) = watch::channel(None);
        AuthSession {
            config,
            client: reqwest::Client::new(),
            tx,
        }
    }

    /// Subscribe to identity-change notifications. The receiver observes the
    /// current value immediately and every change thereafter.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Install an identity directly (no network). Used by frontends that
    /// already know who the user is.
    pub fn sign_in(&self, identity: Identity) {
        info!("[auth] Signed in as {} ({})", identity.display_name, identity.subject);
        let _ = self.tx.send(Some(identity));
    }

    /// Drop the identity. Subscribers holding connections are expected to
    /// disconnect in response.
    pub fn sign_out(&self) {
        if self.tx.borrow().is_some() {
            info!("[auth] Signed out");
        }
        let _ = self.tx.send(None);
    }

    /// Authenticate against the dashboard API and install the resulting
    /// identity on success.
    pub async fn login(&self, email: &str, password: &str) -> EngineResult<Identity> {
        let response = self
            .client
            .post(self.config.login_url())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        let body: LoginResponse = response.json().await.map_err(|e| {
            warn!("[auth] Login response unreadable (HTTP {}): {}", status, e);
            EngineError::Auth(format!("Unexpected login response (HTTP {status})"))
        })?;

        let identity = identity_from_response(body)?;
        self.sign_in(identity.clone());
        Ok(identity)
    }

    /// Reachability probe: GET the login endpoint and return the raw body.
    pub async fn ping(&self) -> EngineResult<String> {
        let response = self.client.get(self.config.login_url()).send().await?;
        Ok(response.text().await?)
    }
}
