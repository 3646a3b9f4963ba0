//! Interception listener.
//!
//! # Module Structure
//!
//! - `server` - ProxyServer struct and accept loop
//! - `handler` - rule matching, delivery and journaling per request
//! - `forwarding` - request URL reconstruction and the transparent proxy fallback
//! - `client` - outbound HTTP client creation and configuration
//! - `context` - shared per-process state
//! - `headers`, `response_ext` - response header and body helpers

mod client;
mod context;
mod forwarding;
mod handler;
mod headers;
mod response_ext;
mod server;


pub use client::{create_http_client, HttpClient};
pub use context::InterceptorState;
pub use forwarding::{reconstruct_forward_url, request_url, ForwardTarget};
pub use handler::handle_request;
pub use headers::{X_INTERCEPTOR_RULE_ID, X_INTERCEPTOR_SOURCE};
pub use response_ext::ProxyBody;
pub use server::ProxyServer;
