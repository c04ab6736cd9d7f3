//! Shared types for deskline.
//!
//! Domain models, HTTP payloads, token claims and the gateway wire format
//! live here so that the storage, gateway and API crates agree on one shape.

pub mod api;
pub mod auth;
pub mod events;
pub mod models;
