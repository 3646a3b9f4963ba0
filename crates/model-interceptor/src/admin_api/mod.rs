//! Management REST API.
//!
//! Reads and replaces the rule document, reads the request journal, suggests
//! rules from log text, and exposes health and Prometheus metrics. Served on
//! its own listener (default port 9003), without authentication.

mod handlers;
mod router;
mod server;
mod types;

pub use server::AdminApiServer;
