//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{config, logs, suggest, system};
use crate::admin_api::types::{collect_body, error_response, get_base_url, method_not_allowed, not_found};
use crate::proxy::InterceptorState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    state: Arc<InterceptorState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());

    debug!("Admin API: {} {}", method, path);

    let response = match (method, path.as_str()) {
        (Method::GET, "/") => system::handle_root(&get_base_url(&req)),
        (Method::GET, "/health") => system::handle_health(),
        (Method::GET, "/metrics") => system::handle_metrics(),
        (Method::GET, "/config") => config::handle_get(state.rules.as_ref()).await,
        (Method::PUT | Method::POST, "/config") => match collect_body(req).await {
            Ok(body) => config::handle_replace(state.rules.as_ref(), &body).await,
            Err(e) => error_response(StatusCode::BAD_REQUEST, &e),
        },
        (Method::GET, "/logs") => logs::handle_list(&state.journal, query.as_deref()).await,
        (Method::POST, "/suggest") => match collect_body(req).await {
            Ok(body) => suggest::handle_suggest(&body),
            Err(e) => error_response(StatusCode::BAD_REQUEST, &e),
        },
        (_, "/" | "/health" | "/metrics" | "/config" | "/logs" | "/suggest") => {
            method_not_allowed()
        }
        _ => not_found(),
    };
    Ok(response)
}
