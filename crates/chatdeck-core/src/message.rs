// Chatdeck Core — Transcript types
// A Message is immutable once appended; the transcript is append-only.

use serde::{Deserialize, Serialize};

/// Per-session message identifier. Assigned from a monotonic counter, so ids
/// sort in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One unit of the transcript. Advisory messages inserted by the controller
/// itself (connection narration, sign-in prompts) use `Sender::Bot` and look
/// like any other bot message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Display text. May contain markup — rendering is the frontend's problem.
    pub text: String,
    pub sender: Sender,
    /// Creation instant, display-only.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Classification tag. Only `template_suggestion` changes behavior.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Selectable options riding on a template-suggestion message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<TemplateOption>>,
}

impl Message {
    /// Whether this message carries a selectable template set.
    pub fn has_templates(&self) -> bool {
        self.templates.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// A selectable suggestion attached to a bot message. The id is unique within
/// its parent message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOption {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}
