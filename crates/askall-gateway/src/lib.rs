//! askall-gateway: HTTP surface for askall
//!
//! Serves `POST /ask-all` and falls back to static files from the configured
//! public directory for every other path.

pub mod protocol;
pub mod routes;
pub mod server;

pub use routes::{AppState, router};
pub use server::{GatewayServer, ServeHandle};
