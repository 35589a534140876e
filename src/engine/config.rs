// Chatdeck Engine — Configuration
//
// One base-URL value, read from the process environment at engine setup and
// passed explicitly into everything that needs it. Nothing below this layer
// reads the environment.

use crate::atoms::error::{EngineError, EngineResult};
use chatdeck_core::SessionConfig;
use log::warn;
use serde::{Deserialize, Serialize};

/// Environment variable holding the dashboard API base URL.
pub const API_URL_ENV: &str = "CHATDECK_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Normalized API base URL (e.g. "https://api.example.com").
    pub api_base_url: String,
}

impl EngineConfig {
    /// Build a config from a raw base URL, normalizing it first.
    pub fn new(api_base_url: &str) -> EngineResult<Self> {
        Ok(EngineConfig {
            api_base_url: normalize_base_url(api_base_url)?,
        })
    }

    /// Read the base URL from `CHATDECK_API_URL`.
    pub fn from_env() -> EngineResult<Self> {
        match std::env::var(API_URL_ENV) {
            Ok(raw) => EngineConfig::new(&raw),
            Err(_) => Err(EngineError::Config(format!(
                "{API_URL_ENV} is not set. Point it at the dashboard API, e.g. https://api.example.com"
            ))),
        }
    }

    /// Endpoint configuration handed to the session controller.
    pub fn session_config(&self) -> EngineResult<SessionConfig> {
        Ok(SessionConfig::new(&self.api_base_url)?)
    }

    pub fn login_url(&self) -> String {
        format!("{}/api/v1/auth/login", self.api_base_url)
    }
}

/// Normalize the base URL to enforce HTTPS.
/// - Strips whitespace and trailing slashes
/// - Coerces `http://` → `https://` with a warning (loopback hosts excepted,
///   so local development against `http://127.0.0.1` keeps working)
/// - Adds `https://` if no scheme is present
/// - Rejects URLs with non-http(s) schemes
fn normalize_base_url(raw: &str) -> EngineResult<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(EngineError::Config("API base URL is required.".into()));
    }

    if let Some(stripped) = url.strip_prefix("http://") {
        let host = stripped.split([':', '/']).next().unwrap_or("");
        if host == "127.0.0.1" || host == "localhost" {
            return Ok(url.to_string());
        }
        warn!(
            "[config] Coerced API base URL from http:// to https:// — \
             credentials must not be sent over plaintext HTTP"
        );
        return Ok(format!("https://{}", stripped));
    }

    if url.starts_with("https://") {
        return Ok(url.to_string());
    }

    // Check for other schemes (ftp://, ws://, etc.)
    if let Some(colon_pos) = url.find("://") {
        let scheme = &url[..colon_pos];
        return Err(EngineError::Config(format!(
            "Unsupported URL scheme '{}://'. Use https:// for the dashboard API.",
            scheme
        )));
    }

    // No scheme at all — assume https
    warn!("[config] No URL scheme provided, assuming https://{}", url);
    Ok(format!("https://{}", url))
}
