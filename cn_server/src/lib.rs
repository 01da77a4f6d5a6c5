//! HTTP and WebSocket front end for the codenames engine.
//!
//! The binary in `main.rs` wires configuration, logging and metrics around
//! [`api::create_router`]; integration tests drive the same router.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
