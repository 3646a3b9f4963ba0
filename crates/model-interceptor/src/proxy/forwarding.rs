//! Request URL reconstruction and the transparent proxy fallback.

use crate::delivery::{Payload, RemoteFetcher};
use crate::error::InterceptError;
use hyper::header::HOST;
use hyper::{HeaderMap, Uri};
use tracing::debug;
use url::Url;

/// A URL embedded in a forward-proxy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    /// The rebuilt string as sent. Rules match against this, byte for byte.
    pub raw: String,
    /// Parsed (normalized) form, used to fetch.
    pub url: Url,
}

/// Rebuild the target URL embedded in a forward-proxy request path.
///
/// `/https:/host/file.bin?x=1` becomes `https://host/file.bin?x=1`. Empty
/// path segments are dropped, so a collapsed `scheme:/` is repaired to
/// `scheme://`. Host case, ports and escapes are kept as sent in `raw`.
pub fn reconstruct_forward_url(
    path: &str,
    query: Option<&str>,
    route_prefix: &str,
) -> Result<ForwardTarget, InterceptError> {
    let embedded = path.strip_prefix(route_prefix).unwrap_or(path);
    let joined = embedded
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    let mut raw = repair_scheme(&joined);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        raw.push('?');
        raw.push_str(query);
    }

    parse_forward_target(raw)
}

/// Validate an absolute http(s) URL, keeping the string it came from.
pub fn parse_forward_target(raw: String) -> Result<ForwardTarget, InterceptError> {
    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(ForwardTarget { raw, url })
        }
        _ => Err(InterceptError::BadTargetUrl(raw)),
    }
}

fn repair_scheme(joined: &str) -> String {
    for scheme in ["http:/", "https:/"] {
        if let Some(rest) = joined.strip_prefix(scheme) {
            if !rest.starts_with('/') {
                return format!("{scheme}/{rest}");
            }
        }
    }
    joined.to_string()
}

/// The full URL a request was addressed to.
///
/// Absolute-form targets (`GET http://host/path`) are used as sent; otherwise
/// the URL is rebuilt from the `Host` header.
pub fn request_url(uri: &Uri, headers: &HeaderMap) -> Result<String, InterceptError> {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Ok(uri.to_string());
    }

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| InterceptError::BadTargetUrl(format!("{path_and_query} (missing Host)")))?;

    Ok(format!("http://{host}{path_and_query}"))
}

/// Fetch an unconfigured URL unchanged.
///
/// Same contract as a remote rule target; failures surface as proxy errors.
pub async fn proxy(fetcher: &RemoteFetcher, target: &Url) -> Result<Payload, InterceptError> {
    debug!(url = %target, "No rule matched, proxying transparently");
    fetcher.fetch(target).await.map_err(InterceptError::Proxy)
}
