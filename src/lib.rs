// Chatdeck Engine — client runtime for the dashboard
//
// Wires the pure core (session state machine, wire protocol, template
// catalog) to its real collaborators: a tokio-tungstenite chatbot
// connection, the dashboard REST API, and a watchable auth session.
// Frontends (the CLI, or anything else) talk to the ChatbotBridge and
// never touch the socket directly.

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use engine::auth::AuthSession;
pub use engine::chatbot::{BridgeEvent, BridgeStatus, ChatbotBridge};
pub use engine::config::EngineConfig;
