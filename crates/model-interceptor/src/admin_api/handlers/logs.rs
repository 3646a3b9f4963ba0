//! Journal handler.

use crate::admin_api::types::*;
use crate::journal::AuditLog;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::error;

/// GET /logs - journal entries, newest first
pub async fn handle_list(journal: &AuditLog, query: Option<&str>) -> Response<Full<Bytes>> {
    let entries = match journal.list().await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read journal: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let range = LogQueryParams::parse(query).range(entries.len());
    json_response(StatusCode::OK, &entries[range])
}
