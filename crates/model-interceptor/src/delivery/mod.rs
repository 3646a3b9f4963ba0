//! Content delivery: local files and remote sources, streamed to the caller.
//!
//! Both delivery modes produce a [`Payload`]: response metadata plus a
//! [`Delivery`] byte stream. The stream reports exactly one
//! [`StreamOutcome`] when it finishes, fails or is dropped early, which is
//! how the handler learns whether a download really completed.

mod local;
mod remote;
mod stream;

pub use local::{serve_local, Sandbox};
pub use remote::RemoteFetcher;
pub use stream::{Delivery, StreamOutcome};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// A resolved download ready to be turned into a response.
pub struct Payload {
    pub content_type: String,
    pub content_length: Option<u64>,
    /// Value for `Content-Disposition: attachment; filename="…"`, when derivable.
    pub filename: Option<String>,
    pub body: Delivery,
}

impl Payload {
    pub fn content_disposition(&self) -> Option<String> {
        self.filename
            .as_deref()
            .map(|name| format!("attachment; filename=\"{name}\""))
    }
}

/// Strip characters that cannot appear inside a quoted filename parameter.
pub(crate) fn sanitize_filename(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
