// Chatdeck Core — Error types
// Session operations themselves never fail — bad preconditions degrade to
// advisory transcript entries or no-ops. The only fallible surface in this
// crate is configuration validation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The API base URL was empty or whitespace.
    #[error("API base URL is required")]
    MissingBaseUrl,

    /// The API base URL used a scheme other than http(s)/ws(s).
    #[error("Unsupported URL scheme '{0}://'. Use https:// for the chatbot API.")]
    UnsupportedScheme(String),
}
