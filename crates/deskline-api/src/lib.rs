//! HTTP surface of deskline: the session/token service, auth middleware,
//! JSON handlers, the gateway handshake and the router that ties them
//! together.

pub mod agent;
pub mod auth;
pub mod conversations;
pub mod error;
pub mod middleware;
pub mod router;
pub mod session;
pub mod state;
pub mod tenants;
pub mod validation;
pub mod ws;

pub use error::ApiError;
pub use router::router;
pub use session::{HashParams, SessionConfig, SessionService};
pub use state::{AppState, AppStateInner};
