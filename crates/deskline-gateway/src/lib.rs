//! Messaging Gateway: per-connection sessions, tenant and conversation rooms,
//! and the chat event contract carried over WebSocket.

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod gateway;

pub use dispatcher::{ConnId, Dispatcher, Room, SessionInfo};
pub use error::GatewayError;
pub use gateway::Gateway;
