// Chatdeck Core — Authenticated identity
// Owned by the auth collaborator; the session controller only ever holds a
// read-only copy and never mutates it.

use serde::{Deserialize, Serialize};

/// The authenticated user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique subject identifier — keys the chatbot connection endpoint.
    pub subject: String,
    /// Display name for ambient UI. Not used by the session controller.
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>, display_name: impl Into<String>) -> Self {
        Identity {
            subject: subject.into(),
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
