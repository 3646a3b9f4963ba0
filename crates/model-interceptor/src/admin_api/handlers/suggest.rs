use crate::admin_api::types::*;
use crate::suggest::{suggest_rule, SuggestionResponse};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::debug;

/// POST /suggest - body is raw log text
pub fn handle_suggest(body: &[u8]) -> Response<Full<Bytes>> {
    let log = String::from_utf8_lossy(body);
    let suggestion = suggest_rule(&log);
    debug!("Rule suggestion: {:?}", suggestion);
    json_response(StatusCode::OK, &SuggestionResponse::from(&suggestion))
}
