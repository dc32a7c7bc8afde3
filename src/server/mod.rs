//! HTTP server for the chat surface.
//!
//! # Endpoints
//!
//! - `GET  /health` : liveness check
//! - `POST /ask`    : answer one question given the conversation so far

pub mod routes;

pub use routes::{app_router, AppState, AskRequest};
