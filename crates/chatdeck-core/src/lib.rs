// Chatdeck Core — session state machine, wire protocol, and template catalog.
// Pure business logic: no sockets, no clocks beyond message timestamps, no
// environment reads. The engine crate adapts this to a real transport.

pub mod error;
pub mod identity;
pub mod message;
pub mod protocol;
pub mod session;
pub mod templates;

pub use error::ConfigError;
pub use identity::Identity;
pub use message::{Message, MessageId, Sender, TemplateOption};
pub use protocol::{ContentUpdate, Frame};
pub use session::{ChatSession, ConnectionPhase, SessionConfig, TemplateView, TransportCommand};
pub use templates::{SavedTemplate, TemplateCatalog};
