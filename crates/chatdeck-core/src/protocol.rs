// Chatdeck Core — Chatbot wire protocol
//
// Every inbound frame is UTF-8 text, decoded independently. The service mixes
// plain text with structured JSON payloads, so decoding happens in one tagged
// step here and the session dispatches on the resulting `Frame` — there is no
// field-peeking spread across the controller.
//
// Inbound payload shape (all fields optional; absent means not-present, never
// false/empty):
//   { loading?: bool, loading_message?: string,
//     message?: string, category?: string,
//     templates?: [{ id, title, description, image_url }] }

use crate::message::TemplateOption;
use serde::Deserialize;

/// Category tag that turns a bot message into a selectable template set.
pub const TEMPLATE_SUGGESTION: &str = "template_suggestion";

/// Caption shown when the service starts loading without supplying one.
pub const DEFAULT_LOADING_CAPTION: &str = "Loading...";

/// Introductory text for a template-suggestion message that arrived without
/// any message text of its own.
pub const DEFAULT_SUGGESTION_TEXT: &str = "Here are some templates you can choose from:";

// ── Raw payload ────────────────────────────────────────────────────────

/// Structured inbound payload, exactly as it appears on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundPayload {
    pub loading: Option<bool>,
    pub loading_message: Option<String>,
    pub message: Option<String>,
    pub category: Option<String>,
    pub templates: Option<Vec<TemplateOption>>,
}

// ── Tagged decode result ───────────────────────────────────────────────

/// Content fields of a frame, shared between the bare form and the
/// `loading:false` form so both dispatch through one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUpdate {
    /// Message text. Empty strings on the wire count as absent.
    pub text: Option<String>,
    pub category: Option<String>,
    pub templates: Vec<TemplateOption>,
}

impl ContentUpdate {
    fn from_payload(payload: InboundPayload) -> Self {
        ContentUpdate {
            text: payload.message.filter(|m| !m.is_empty()),
            category: payload.category,
            templates: payload.templates.unwrap_or_default(),
        }
    }

    fn into_option(self) -> Option<Self> {
        if self.text.is_none() && self.category.is_none() && self.templates.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// A template-suggestion update needs both the category tag and at least
    /// one option; a tagged frame with an empty list falls back to plain text.
    pub fn is_template_suggestion(&self) -> bool {
        self.category.as_deref() == Some(TEMPLATE_SUGGESTION) && !self.templates.is_empty()
    }
}

/// One inbound frame, decoded. Variant order mirrors the dispatch precedence:
/// an unparseable frame is raw bot text, an explicit loading flag wins over
/// content fields, and a structurally empty payload is silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The frame was not a structured payload — show it verbatim.
    PlainText(String),
    /// `loading: true` — show the indicator, append nothing.
    LoadingOn { caption: String },
    /// `loading: false` — hide the indicator; content fields may ride along.
    LoadingOff { content: Option<ContentUpdate> },
    /// No loading flag at all — bare content fields.
    Content(ContentUpdate),
    /// Structured, but empty of recognized fields.
    Empty,
}

/// Decode one raw frame. Never fails: malformed input degrades to
/// `Frame::PlainText` with the original bytes.
pub fn decode_frame(raw: &str) -> Frame {
    let payload: InboundPayload = match serde_json::from_str(raw) {
        Ok(p) => p,
        Err(_) => return Frame::PlainText(raw.to_string()),
    };

    match payload.loading {
        Some(true) => Frame::LoadingOn {
            caption: payload
                .loading_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_LOADING_CAPTION.to_string()),
        },
        Some(false) => Frame::LoadingOff {
            content: ContentUpdate::from_payload(payload).into_option(),
        },
        None => match ContentUpdate::from_payload(payload).into_option() {
            Some(content) => Frame::Content(content),
            None => Frame::Empty,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstructured_frame_is_plain_text() {
        assert_eq!(decode_frame("hello"), Frame::PlainText("hello".into()));
    }

    #[test]
    fn json_scalar_is_plain_text() {
        // Valid JSON, but not a payload object — same fallback as garbage.
        assert_eq!(decode_frame("\"hello\""), Frame::PlainText("\"hello\"".into()));
        assert_eq!(decode_frame("null"), Frame::PlainText("null".into()));
    }

    #[test]
    fn loading_on_carries_caption() {
        let frame = decode_frame(r#"{"loading":true,"loading_message":"Thinking"}"#);
        assert_eq!(frame, Frame::LoadingOn { caption: "Thinking".into() });
    }

    #[test]
    fn loading_on_defaults_caption() {
        let frame = decode_frame(r#"{"loading":true}"#);
        assert_eq!(frame, Frame::LoadingOn { caption: DEFAULT_LOADING_CAPTION.into() });

        // Empty captions count as absent, same as empty message text.
        let frame = decode_frame(r#"{"loading":true,"loading_message":""}"#);
        assert_eq!(frame, Frame::LoadingOn { caption: DEFAULT_LOADING_CAPTION.into() });
    }

    #[test]
    fn loading_off_without_content() {
        let frame = decode_frame(r#"{"loading":false}"#);
        assert_eq!(frame, Frame::LoadingOff { content: None });
    }

    #[test]
    fn loading_off_with_templates() {
        let frame = decode_frame(
            r#"{"loading":false,"category":"template_suggestion",
                "templates":[{"id":"t1","title":"Welcome","description":"d","image_url":"u"}]}"#,
        );
        let Frame::LoadingOff { content: Some(content) } = frame else {
            panic!("expected LoadingOff with content, got {frame:?}");
        };
        assert!(content.is_template_suggestion());
        assert_eq!(content.templates.len(), 1);
        assert_eq!(content.templates[0].id, "t1");
    }

    #[test]
    fn bare_message_is_content() {
        let frame = decode_frame(r#"{"message":"hi there"}"#);
        assert_eq!(
            frame,
            Frame::Content(ContentUpdate {
                text: Some("hi there".into()),
                category: None,
                templates: vec![],
            })
        );
    }

    #[test]
    fn empty_object_is_silent() {
        assert_eq!(decode_frame("{}"), Frame::Empty);
        assert_eq!(decode_frame(r#"{"message":""}"#), Frame::Empty);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let frame = decode_frame(r#"{"message":"hi","seq":42,"trace_id":"abc"}"#);
        assert!(matches!(frame, Frame::Content(_)));
    }

    #[test]
    fn suggestion_tag_with_empty_list_is_not_a_suggestion() {
        let frame = decode_frame(r#"{"category":"template_suggestion","templates":[]}"#);
        let Frame::Content(content) = frame else {
            panic!("expected Content");
        };
        assert!(!content.is_template_suggestion());
    }

    #[test]
    fn template_entries_tolerate_missing_display_fields() {
        let frame = decode_frame(
            r#"{"category":"template_suggestion","templates":[{"id":"t9"}]}"#,
        );
        let Frame::Content(content) = frame else {
            panic!("expected Content");
        };
        assert_eq!(content.templates[0].id, "t9");
        assert_eq!(content.templates[0].title, "");
    }
}
