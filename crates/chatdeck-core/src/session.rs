// Chatdeck Core — Chat session controller
//
// One state container per chat widget: connection lifecycle, append-only
// transcript, loading indicator, and per-message template selections. The
// controller performs no I/O — operations that need the network return a
// `TransportCommand` for the connection adapter to execute, and transport
// events come back in through the `on_*` methods. All calls are expected to
// arrive serialized (one event loop / one lock around the session).
//
// Lifecycle:  Disconnected → Connecting → Connected → Disconnected, forever.
// The loading indicator is orthogonal and is force-cleared whenever the
// connection drops.

use crate::identity::Identity;
use crate::message::{Message, MessageId, Sender, TemplateOption};
use crate::protocol::{self, ContentUpdate, Frame};
use crate::ConfigError;
use log::{debug, info};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

// ── Advisory texts ─────────────────────────────────────────────────────
// Inserted into the transcript by the controller itself to narrate
// lifecycle events. Same register as the service's own messages.

const ADVISORY_SIGN_IN: &str = "Please sign in to connect.";
const ADVISORY_CONNECTED: &str = "Connected to chatbot!";
const ADVISORY_DISCONNECTED: &str = "Disconnected from chatbot";
const ADVISORY_ERROR: &str = "Connection error. Please try again.";

// ── Configuration ──────────────────────────────────────────────────────

/// Connection endpoint configuration, passed in at construction. The
/// controller never reads process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    api_base: String,
}

impl SessionConfig {
    /// Validate and store the API base address. Trailing slashes are
    /// stripped; a missing scheme is assumed to be `https`.
    pub fn new(api_base: impl Into<String>) -> Result<Self, ConfigError> {
        let base = api_base.into();
        let base = base.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        if let Some(colon) = base.find("://") {
            let scheme = &base[..colon];
            if !matches!(scheme, "http" | "https" | "ws" | "wss") {
                return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
            }
            return Ok(SessionConfig { api_base: base.to_string() });
        }

        Ok(SessionConfig { api_base: format!("https://{base}") })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Derive the duplex endpoint for a given identity subject:
    /// `<base>/api/v1/chatbot/ws/<subject>`, with the HTTP scheme swapped
    /// for its WebSocket counterpart.
    pub fn chat_endpoint(&self, subject: &str) -> String {
        let ws_base = if self.api_base.starts_with("https") {
            self.api_base.replacen("https", "wss", 1)
        } else if self.api_base.starts_with("http") {
            self.api_base.replacen("http", "ws", 1)
        } else {
            self.api_base.clone()
        };
        format!("{}/api/v1/chatbot/ws/{}", ws_base, urlencoding::encode(subject))
    }
}

// ── Transport seam ─────────────────────────────────────────────────────

/// What the controller asks the connection adapter to do. Fire-and-forget:
/// no acknowledgement is awaited before the controller considers the
/// operation done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Open a duplex connection to the given endpoint.
    Open { endpoint: String },
    /// Send one text frame over the open connection.
    Send { frame: String },
    /// Release the connection handle. Safe to issue with no handle open.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionPhase::Disconnected => "disconnected",
            ConnectionPhase::Connecting => "connecting",
            ConnectionPhase::Connected => "connected",
        }
    }
}

/// Per-message template rendering contract: a recorded selection narrows the
/// view to the chosen option (or nothing, when the recorded id matches no
/// option); otherwise every option is offered as a choice set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateView<'a> {
    /// The message carries no templates.
    None,
    /// A selection was recorded. `None` inside means the recorded id is not
    /// in the option list — render nothing rather than erroring.
    Selected(Option<&'a TemplateOption>),
    /// No selection yet — offer all options.
    Choices(&'a [TemplateOption]),
}

// ── Controller ─────────────────────────────────────────────────────────

pub struct ChatSession {
    config: SessionConfig,
    identity: Option<Identity>,
    phase: ConnectionPhase,
    /// `Some(caption)` while the service reports it is working.
    loading: Option<String>,
    transcript: Vec<Message>,
    selections: HashMap<MessageId, String>,
    next_id: u64,
}

impl ChatSession {
    pub fn new(config: SessionConfig) -> Self {
        ChatSession {
            config,
            identity: None,
            phase: ConnectionPhase::Disconnected,
            loading: None,
            transcript: Vec::new(),
            selections: HashMap::new(),
            next_id: 0,
        }
    }

    // ── Read-only view model ───────────────────────────────────────────

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Loading caption, when the service reported `loading: true`.
    pub fn loading(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The transcript, in append order. Never reordered, never mutated.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.transcript.iter().find(|m| m.id == id)
    }

    /// Recorded template selection for a message, if any.
    pub fn selection(&self, id: MessageId) -> Option<&str> {
        self.selections.get(&id).map(String::as_str)
    }

    pub fn template_view(&self, id: MessageId) -> TemplateView<'_> {
        let Some(options) = self.message(id).and_then(|m| m.templates.as_deref()) else {
            return TemplateView::None;
        };
        match self.selections.get(&id) {
            Some(selected) => {
                TemplateView::Selected(options.iter().find(|t| &t.id == selected))
            }
            None => TemplateView::Choices(options),
        }
    }

    // ── Identity notifications ─────────────────────────────────────────

    /// Apply an identity-change notification from the auth collaborator.
    /// Losing the identity mid-connection behaves like a user disconnect.
    pub fn set_identity(&mut self, identity: Option<Identity>) -> Option<TransportCommand> {
        let signed_out = identity.is_none() && self.identity.is_some();
        self.identity = identity;

        if signed_out && self.phase != ConnectionPhase::Disconnected {
            info!("[session] Identity lost while {} — disconnecting", self.phase.as_str());
            return self.disconnect();
        }
        None
    }

    // ── Connection lifecycle ───────────────────────────────────────────

    /// Start connecting. No-op unless currently disconnected; without an
    /// identity this appends an advisory instead of attempting anything.
    pub fn connect(&mut self) -> Option<TransportCommand> {
        if self.phase != ConnectionPhase::Disconnected {
            debug!("[session] connect() ignored while {}", self.phase.as_str());
            return None;
        }

        let Some(identity) = &self.identity else {
            self.push_bot(ADVISORY_SIGN_IN.to_string());
            return None;
        };

        let endpoint = self.config.chat_endpoint(&identity.subject);
        self.phase = ConnectionPhase::Connecting;
        info!("[session] Connecting to {}", endpoint);
        Some(TransportCommand::Open { endpoint })
    }

    /// User-initiated disconnect. Forces `Disconnected` regardless of prior
    /// phase; the adapter treats the returned `Close` as a no-op when no
    /// handle is open, so calling this repeatedly is harmless.
    pub fn disconnect(&mut self) -> Option<TransportCommand> {
        self.phase = ConnectionPhase::Disconnected;
        Some(TransportCommand::Close)
    }

    /// The transport reported the connection is open.
    pub fn on_open(&mut self) {
        if self.phase != ConnectionPhase::Connecting {
            debug!("[session] Stale open event while {}", self.phase.as_str());
            return;
        }
        self.phase = ConnectionPhase::Connected;
        self.push_bot(ADVISORY_CONNECTED.to_string());
    }

    /// The transport reported a clean close.
    pub fn on_close(&mut self) {
        self.phase = ConnectionPhase::Disconnected;
        self.loading = None;
        self.push_bot(ADVISORY_DISCONNECTED.to_string());
    }

    /// The transport reported an error. Terminal for this connection — there
    /// is no automatic reconnect; a fresh `connect()` starts over.
    pub fn on_error(&mut self) {
        self.phase = ConnectionPhase::Disconnected;
        self.loading = None;
        self.push_bot(ADVISORY_ERROR.to_string());
    }

    // ── Inbound frames ─────────────────────────────────────────────────

    /// Apply one received frame. Connection phase never changes here; frames
    /// already delivered are processed even if a disconnect has been
    /// requested in the meantime.
    pub fn on_frame(&mut self, raw: &str) {
        match protocol::decode_frame(raw) {
            Frame::PlainText(text) => {
                // A malformed frame also dismisses any active loading
                // indicator before the raw text is shown.
                self.loading = None;
                self.push_bot(text);
            }
            Frame::LoadingOn { caption } => {
                debug!("[session] Loading: {}", caption);
                self.loading = Some(caption);
            }
            Frame::LoadingOff { content } => {
                self.loading = None;
                if let Some(content) = content {
                    self.apply_content(content);
                }
            }
            Frame::Content(content) => self.apply_content(content),
            Frame::Empty => {}
        }
    }

    /// Shared content path for bare frames and `loading:false` frames. The
    /// template-suggestion branch takes precedence over plain message text.
    fn apply_content(&mut self, content: ContentUpdate) {
        if content.is_template_suggestion() {
            let text = content
                .text
                .unwrap_or_else(|| protocol::DEFAULT_SUGGESTION_TEXT.to_string());
            self.push_bot_rich(text, content.category, content.templates);
        } else if let Some(text) = content.text {
            self.push_bot_rich(text, content.category, content.templates);
        }
        // No text and no usable suggestion: nothing to append.
    }

    // ── Outbound ───────────────────────────────────────────────────────

    /// Send chat text. No-op while not connected or for blank input. The
    /// local echo is appended before transmission and is not rolled back if
    /// the send later fails.
    pub fn send_text(&mut self, input: &str) -> Option<TransportCommand> {
        if self.phase != ConnectionPhase::Connected || input.trim().is_empty() {
            return None;
        }
        self.push_user(input.to_string());
        Some(TransportCommand::Send {
            frame: json!({ "message": input }).to_string(),
        })
    }

    /// Choose a template offered by a bot message. The chosen id is not
    /// validated against the message's option list — an unlisted id is still
    /// recorded and simply renders as no match.
    pub fn select_template(
        &mut self,
        message_id: MessageId,
        template_id: &str,
    ) -> Option<TransportCommand> {
        if self.phase != ConnectionPhase::Connected {
            return None;
        }

        let label = self
            .message(message_id)
            .and_then(|m| m.templates.as_ref())
            .and_then(|ts| ts.iter().find(|t| t.id == template_id))
            .map(|t| t.title.clone())
            .unwrap_or_else(|| template_id.to_string());

        self.push_user(format!("Selected template: {label}"));
        self.selections.insert(message_id, template_id.to_string());
        Some(TransportCommand::Send {
            frame: json!({ "template_id": template_id }).to_string(),
        })
    }

    // ── Transcript internals ───────────────────────────────────────────

    fn push(&mut self, sender: Sender, text: String) -> MessageId {
        self.push_full(sender, text, None, None)
    }

    fn push_full(
        &mut self,
        sender: Sender,
        text: String,
        category: Option<String>,
        templates: Option<Vec<TemplateOption>>,
    ) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.transcript.push(Message {
            id,
            text,
            sender,
            timestamp: chrono::Utc::now(),
            category,
            templates,
        });
        id
    }

    fn push_bot(&mut self, text: String) {
        self.push(Sender::Bot, text);
    }

    fn push_user(&mut self, text: String) {
        self.push(Sender::User, text);
    }

    fn push_bot_rich(
        &mut self,
        text: String,
        category: Option<String>,
        templates: Vec<TemplateOption>,
    ) {
        let templates = if templates.is_empty() { None } else { Some(templates) };
        self.push_full(Sender::Bot, text, category, templates);
    }
}
