// Chatdeck Engine — Chatbot Bridge
//
// Connects the dashboard to the chatbot service via an outbound WebSocket
// keyed to the authenticated identity. The session state machine (transcript,
// phases, selections) lives in chatdeck-core; this bridge owns the single
// connection handle, executes the controller's transport commands, and feeds
// transport events back in. All controller access goes through one mutex, so
// transitions stay serialized no matter which task triggered them.
//
// There is no automatic reconnect — a dropped connection stays dropped until
// the user asks to connect again.

use crate::atoms::error::EngineResult;
use crate::engine::auth::AuthSession;
use crate::engine::config::EngineConfig;
use chatdeck_core::{ChatSession, ConnectionPhase, Message, MessageId, TransportCommand};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

// ── Frontend-facing events & status ────────────────────────────────────

/// Broadcast to every subscriber whenever the session state changes.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// A message was appended to the transcript (user, bot, or advisory).
    Message(Message),
    /// The connection phase changed.
    Phase(ConnectionPhase),
    /// The loading indicator changed (caption, or None when cleared).
    Loading(Option<String>),
}

/// Point-in-time snapshot for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub phase: ConnectionPhase,
    pub loading: Option<String>,
    pub message_count: usize,
    /// Display name of the signed-in user, if any.
    pub user: Option<String>,
}

// ── Connection plumbing ────────────────────────────────────────────────

enum WsCommand {
    Send(String),
    Close,
}

/// The one connection slot. Dropping the sender (or sending `Close`) makes
/// the socket task shut the stream down, so releasing the handle is always
/// just taking it out of the slot.
struct ConnectionHandle {
    id: String,
    commands: mpsc::UnboundedSender<WsCommand>,
}

struct BridgeInner {
    session: Mutex<ChatSession>,
    conn: Mutex<Option<ConnectionHandle>>,
    events: broadcast::Sender<BridgeEvent>,
}

impl BridgeInner {
    /// Release the connection handle, if one is open. Safe to call any number
    /// of times — the slot can only be taken once per connection.
    fn release_connection(&self) {
        if let Some(handle) = self.conn.lock().take() {
            debug!("[chatbot] Releasing connection {}", handle.id);
            let _ = handle.commands.send(WsCommand::Close);
        }
    }

    /// Clear the slot, but only if it still belongs to the given connection —
    /// a newer connection may have replaced it already.
    fn clear_connection(&self, conn_id: &str) {
        let mut conn = self.conn.lock();
        if conn.as_ref().is_some_and(|h| h.id == conn_id) {
            *conn = None;
        }
    }
}

/// Run one controller operation under the session lock, broadcast what
/// changed, then execute whatever transport command it produced. Every state
/// transition in the bridge goes through here, which keeps them serialized.
fn apply_session(
    inner: &Arc<BridgeInner>,
    op: impl FnOnce(&mut ChatSession) -> Option<TransportCommand>,
) {
    let command = {
        let mut session = inner.session.lock();
        let seen = session.transcript().len();
        let phase = session.phase();
        let loading = session.loading().map(str::to_string);

        let command = op(&mut session);

        for message in &session.transcript()[seen..] {
            let _ = inner.events.send(BridgeEvent::Message(message.clone()));
        }
        if session.phase() != phase {
            let _ = inner.events.send(BridgeEvent::Phase(session.phase()));
        }
        let loading_now = session.loading().map(str::to_string);
        if loading_now != loading {
            let _ = inner.events.send(BridgeEvent::Loading(loading_now));
        }
        command
    };

    if let Some(command) = command {
        execute(inner, command);
    }
}

fn execute(inner: &Arc<BridgeInner>, command: TransportCommand) {
    match command {
        TransportCommand::Open { endpoint } => open_connection(inner, endpoint),
        TransportCommand::Send { frame } => match inner.conn.lock().as_ref() {
            Some(handle) => {
                let _ = handle.commands.send(WsCommand::Send(frame));
            }
            None => warn!("[chatbot] Dropping outbound frame — no open connection"),
        },
        TransportCommand::Close => inner.release_connection(),
    }
}

fn open_connection(inner: &Arc<BridgeInner>, endpoint: String) {
    let conn_id = uuid::Uuid::new_v4().to_string().replace('-', "")[..12].to_string();
    let (tx, rx) = mpsc::unbounded_channel();
    *inner.conn.lock() = Some(ConnectionHandle { id: conn_id.clone(), commands: tx });

    let task_inner = Arc::clone(inner);
    tokio::spawn(run_connection(task_inner, conn_id, endpoint, rx));
}

// ── Socket task ────────────────────────────────────────────────────────

async fn run_connection(
    inner: Arc<BridgeInner>,
    conn_id: String,
    endpoint: String,
    mut commands: mpsc::UnboundedReceiver<WsCommand>,
) {
    let ws_stream = match connect_async(&endpoint).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!("[chatbot] Connection to {} failed: {}", endpoint, e);
            inner.clear_connection(&conn_id);
            apply_session(&inner, |s| {
                s.on_error();
                None
            });
            return;
        }
    };

    info!("[chatbot] Connection {} open", conn_id);
    apply_session(&inner, |s| {
        s.on_open();
        None
    });

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut failed = false;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(WsCommand::Send(frame)) => {
                    // Fire-and-forget: a failed send surfaces through the
                    // read side as a close/error event, not as a caller error.
                    if let Err(e) = ws_tx.send(WsMessage::Text(frame)).await {
                        warn!("[chatbot] Send on {} failed: {}", conn_id, e);
                    }
                }
                Some(WsCommand::Close) | None => {
                    let _ = ws_tx.send(WsMessage::Close(None)).await;
                    break;
                }
            },
            frame = ws_rx.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    apply_session(&inner, |s| {
                        s.on_frame(&text);
                        None
                    });
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    let _ = ws_tx.send(WsMessage::Pong(data)).await;
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("[chatbot] Connection {} closed by peer", conn_id);
                    break;
                }
                Some(Err(e)) => {
                    warn!("[chatbot] Connection {} error: {}", conn_id, e);
                    failed = true;
                    break;
                }
                _ => {}
            },
        }
    }

    inner.clear_connection(&conn_id);
    apply_session(&inner, |s| {
        if failed {
            s.on_error();
        } else {
            s.on_close();
        }
        None
    });
}

// ── Bridge ─────────────────────────────────────────────────────────────

/// One chat widget's worth of runtime: session + socket + auth subscription.
/// Construct inside a tokio runtime; drop to tear everything down.
pub struct ChatbotBridge {
    inner: Arc<BridgeInner>,
    auth_watch: tokio::task::JoinHandle<()>,
}

impl ChatbotBridge {
    /// Build a bridge and subscribe it to the auth collaborator's identity
    /// stream. The subscription lasts until the bridge is dropped.
    pub fn new(config: &EngineConfig, auth: &AuthSession) -> EngineResult<Self> {
        // Subscribe before seeding the identity so a sign-in landing between
        // the two is never missed.
        let mut identity_rx = auth.subscribe();

        let mut session = ChatSession::new(config.session_config()?);
        let _ = session.set_identity(identity_rx.borrow_and_update().clone());

        let (events, _) = broadcast::channel(256);
        let inner = Arc::new(BridgeInner {
            session: Mutex::new(session),
            conn: Mutex::new(None),
            events,
        });

        let watch_inner = Arc::clone(&inner);
        let auth_watch = tokio::spawn(async move {
            while identity_rx.changed().await.is_ok() {
                let identity = identity_rx.borrow_and_update().clone();
                apply_session(&watch_inner, move |s| s.set_identity(identity));
            }
        });

        Ok(ChatbotBridge { inner, auth_watch })
    }

    /// Subscribe to session updates. Slow consumers may observe `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.inner.events.subscribe()
    }

    pub fn connect(&self) {
        apply_session(&self.inner, |s| s.connect());
    }

    pub fn disconnect(&self) {
        apply_session(&self.inner, |s| s.disconnect());
    }

    pub fn send_text(&self, text: &str) {
        apply_session(&self.inner, |s| s.send_text(text));
    }

    pub fn select_template(&self, message_id: MessageId, template_id: &str) {
        apply_session(&self.inner, |s| s.select_template(message_id, template_id));
    }

    /// Snapshot of the transcript in append order.
    pub fn transcript(&self) -> Vec<Message> {
        self.inner.session.lock().transcript().to_vec()
    }

    pub fn selection(&self, message_id: MessageId) -> Option<String> {
        self.inner.session.lock().selection(message_id).map(str::to_string)
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.inner.session.lock().phase()
    }

    pub fn status(&self) -> BridgeStatus {
        let session = self.inner.session.lock();
        BridgeStatus {
            phase: session.phase(),
            loading: session.loading().map(str::to_string),
            message_count: session.transcript().len(),
            user: session.identity().map(|i| i.display_name.clone()),
        }
    }
}

impl Drop for ChatbotBridge {
    /// Teardown releases the connection on every exit path, including after
    /// an explicit `disconnect()` — the slot take makes the release
    /// idempotent.
    fn drop(&mut self) {
        self.auth_watch.abort();
        self.inner.release_connection();
    }
}
