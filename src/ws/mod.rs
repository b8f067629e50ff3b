//! WebSocket transport: wire protocol, client hub, connection handler

pub mod handler;
pub mod hub;
pub mod protocol;

pub use hub::{ClientHub, ClientSink, IntentHandler};
