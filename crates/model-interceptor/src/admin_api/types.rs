//! Response types and helpers for the Admin API.

use crate::error::RuleIssue;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;

/// Largest request body the admin API will read.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Link structure used by the root document
#[derive(Debug, Serialize, Clone)]
pub struct Link {
    pub href: String,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Rejected rule document: one issue per offending rule field.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub message: String,
    pub errors: Vec<RuleIssue>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Pagination for `/logs`, as `startIndex`/`endIndex` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQueryParams {
    pub start_index: usize,
    pub end_index: Option<usize>,
}

impl LogQueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let mut params = Self {
            start_index: 0,
            end_index: None,
        };
        for (key, value) in query
            .unwrap_or_default()
            .split('&')
            .filter_map(|pair| pair.split_once('='))
        {
            match key {
                "startIndex" => {
                    if let Ok(v) = value.parse() {
                        params.start_index = v;
                    }
                }
                "endIndex" => {
                    if let Ok(v) = value.parse() {
                        params.end_index = Some(v);
                    }
                }
                _ => {}
            }
        }
        params
    }

    /// The selected slice bounds for a journal of `len` entries.
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let end = self.end_index.unwrap_or(len).min(len);
        let start = self.start_index.min(end);
        start..end
    }
}

/// Extract base URL from request headers for links
pub fn get_base_url(req: &Request<Incoming>) -> String {
    if let Some(host) = req.headers().get("host") {
        if let Ok(host_str) = host.to_str() {
            return format!("http://{}", host_str);
        }
    }
    "http://localhost:9003".to_string()
}

/// Create a JSON response
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with headers.
///
/// Falls back to a bare response if the builder rejects the inputs.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create an error response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail {
            code: status.as_str().to_string(),
            message: message.to_string(),
        }],
    };
    json_response(status, &error)
}

/// Create a not found response
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

pub fn method_not_allowed() -> Response<Full<Bytes>> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Collect request body into bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}
