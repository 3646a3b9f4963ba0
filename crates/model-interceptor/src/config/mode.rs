//! Interception mode.

use serde::{Deserialize, Serialize};

/// How the inbound request URL is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InterceptMode {
    /// The request's own URL is matched; no match is a 404.
    #[default]
    Path,
    /// The request path carries the full target URL; no match is proxied through.
    ForwardProxy,
}

impl InterceptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterceptMode::Path => "path",
            InterceptMode::ForwardProxy => "forward-proxy",
        }
    }
}

impl std::str::FromStr for InterceptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "path" => Ok(InterceptMode::Path),
            "forward-proxy" | "proxy" => Ok(InterceptMode::ForwardProxy),
            other => Err(format!(
                "Unknown interception mode: {other} (expected 'path' or 'forward-proxy')"
            )),
        }
    }
}
