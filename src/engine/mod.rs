// Chatdeck Engine — dashboard client runtime
// One bridge per chat widget: the session state machine lives in
// chatdeck-core, the engine owns the socket, the auth watch stream,
// and the REST calls around it.

pub mod auth;
pub mod chatbot;
pub mod config;
