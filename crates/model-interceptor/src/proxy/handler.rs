//! Request handling: resolve the request URL, match a rule, deliver, record.

use super::context::InterceptorState;
use super::forwarding::{parse_forward_target, proxy, reconstruct_forward_url, request_url};
use super::headers::{InterceptorHeadersExt, X_INTERCEPTOR_RULE_ID, X_INTERCEPTOR_SOURCE};
use super::response_ext::{empty_body, stream_body, text_response, ProxyBody};
use crate::config::InterceptMode;
use crate::delivery::{serve_local, Payload, StreamOutcome};
use crate::error::InterceptError;
use crate::journal::{AuditLog, NewLogEntry};
use crate::matcher::RuleSet;
use crate::metrics;
use crate::rules::Target;
use hyper::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Local,
    Remote,
    Proxy,
}

impl Source {
    fn as_str(&self) -> &'static str {
        match self {
            Source::Local => "local",
            Source::Remote => "remote",
            Source::Proxy => "proxy",
        }
    }
}

struct Resolved {
    payload: Payload,
    source: Source,
    rule_id: Option<String>,
    /// What the journal records as served on success.
    served: String,
}

/// Where the request was addressed, as matched against rules.
struct Addressed {
    url: String,
    /// Set in forward-proxy mode, where an unmatched URL is proxied.
    proxy_target: Option<Url>,
}

/// Handle one intercepted request. The request body is never read.
pub async fn handle_request<B>(
    state: &InterceptorState,
    req: Request<B>,
) -> Result<Response<ProxyBody>, Infallible> {
    let method = req.method().clone();
    let mut journal_url = req.uri().to_string();

    let result = match address(state, &req) {
        Ok(addressed) => {
            journal_url = addressed.url.clone();
            if is_supported_method(&method) {
                resolve(state, addressed).await
            } else {
                Err(InterceptError::MethodNotAllowed(method.to_string()))
            }
        }
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(resolved) => deliver(&state.journal, &method, journal_url, resolved),
        Err(e) => reject(&state.journal, &method, journal_url, e),
    };
    Ok(response)
}

fn is_supported_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::HEAD
    )
}

fn address<B>(state: &InterceptorState, req: &Request<B>) -> Result<Addressed, InterceptError> {
    let uri = req.uri();
    match state.mode {
        InterceptMode::Path => Ok(Addressed {
            url: request_url(uri, req.headers())?,
            proxy_target: None,
        }),
        InterceptMode::ForwardProxy => {
            // Real proxy clients send absolute-form targets.
            let target = if uri.scheme().is_some() && uri.authority().is_some() {
                parse_forward_target(uri.to_string())?
            } else {
                reconstruct_forward_url(uri.path(), uri.query(), &state.route_prefix)?
            };
            Ok(Addressed {
                url: target.raw,
                proxy_target: Some(target.url),
            })
        }
    }
}

async fn resolve(
    state: &InterceptorState,
    addressed: Addressed,
) -> Result<Resolved, InterceptError> {
    let document = state
        .rules
        .load()
        .await
        .map_err(|e| InterceptError::Internal(format!("Failed to load rules: {e}")))?;
    let rules = RuleSet::compile(document);

    let Some(rule) = rules.find(&addressed.url) else {
        return match addressed.proxy_target {
            Some(target) => {
                let started = Instant::now();
                let result = proxy(&state.fetcher, &target).await;
                metrics::record_upstream_duration(
                    Source::Proxy.as_str(),
                    result.is_ok(),
                    started.elapsed().as_secs_f64() * 1000.0,
                );
                Ok(Resolved {
                    payload: result?,
                    source: Source::Proxy,
                    rule_id: None,
                    served: format!("{target} (Proxied)"),
                })
            }
            None => Err(InterceptError::NoRuleMatch),
        };
    };

    debug!(rule_id = %rule.id, url = %addressed.url, "Matched interception rule");
    let target = rule
        .target
        .clone()
        .map_err(|e| e.into_intercept_error(&rule.id))?;
    let served = target.describe();

    let (payload, source) = match &target {
        Target::Local(path) => (serve_local(&state.sandbox, path).await?, Source::Local),
        Target::Remote(url) => {
            let started = Instant::now();
            let result = state.fetcher.fetch(url).await;
            metrics::record_upstream_duration(
                Source::Remote.as_str(),
                result.is_ok(),
                started.elapsed().as_secs_f64() * 1000.0,
            );
            (result.map_err(InterceptError::Upstream)?, Source::Remote)
        }
    };

    Ok(Resolved {
        payload,
        source,
        rule_id: Some(rule.id.clone()),
        served,
    })
}

fn deliver(
    journal: &AuditLog,
    method: &Method,
    request_url: String,
    resolved: Resolved,
) -> Response<ProxyBody> {
    let Resolved {
        payload,
        source,
        rule_id,
        served,
    } = resolved;
    metrics::record_request(method.as_str(), source.as_str());

    let content_disposition = payload.content_disposition();
    let Payload {
        content_type,
        content_length,
        body,
        ..
    } = payload;

    let body = if *method == Method::HEAD {
        // Headers only; dropping the delivery releases the file or upstream body now.
        drop(body);
        info!(url = %request_url, served = %served, "Answered HEAD request");
        metrics::record_delivery(source.as_str(), "completed", 0);
        journal.record(NewLogEntry::success(&request_url, &served).with_method(method.as_str()));
        empty_body()
    } else {
        let journal = journal.clone();
        let method_name = method.to_string();
        stream_body(body.on_finish(move |outcome| {
            report_outcome(&journal, source, request_url, served, method_name, outcome)
        }))
    };

    let mut response = Response::new(body);
    if !response.set_header_value(&CONTENT_TYPE, &content_type) {
        response.set_header(
            &CONTENT_TYPE,
            &HeaderValue::from_static(crate::delivery::OCTET_STREAM),
        );
    }
    if let Some(length) = content_length {
        response.set_header(&CONTENT_LENGTH, &HeaderValue::from(length));
    }
    if let Some(disposition) = content_disposition {
        response.set_header_value(&CONTENT_DISPOSITION, &disposition);
    }
    if let Some(rule_id) = rule_id {
        response.set_header_value(&X_INTERCEPTOR_RULE_ID, &rule_id);
    }
    response.set_header(
        &X_INTERCEPTOR_SOURCE,
        &HeaderValue::from_static(source.as_str()),
    );
    response
}

fn report_outcome(
    journal: &AuditLog,
    source: Source,
    request_url: String,
    served: String,
    method: String,
    outcome: StreamOutcome,
) {
    let entry = match outcome {
        StreamOutcome::Completed { bytes_sent } => {
            info!(url = %request_url, served = %served, bytes_sent, "Delivery completed");
            metrics::record_delivery(source.as_str(), "completed", bytes_sent);
            NewLogEntry::success(request_url, served)
        }
        StreamOutcome::Failed { bytes_sent, cause } => {
            warn!(url = %request_url, served = %served, bytes_sent, cause = %cause, "Delivery failed");
            metrics::record_delivery(source.as_str(), "failed", bytes_sent);
            NewLogEntry::error(
                request_url,
                format!("{served} ({cause} after {bytes_sent} bytes)"),
            )
        }
        StreamOutcome::Abandoned { bytes_sent } => {
            warn!(url = %request_url, served = %served, bytes_sent, "Client disconnected");
            metrics::record_delivery(source.as_str(), "abandoned", bytes_sent);
            NewLogEntry::error(
                request_url,
                format!("{served} (Client disconnected after {bytes_sent} bytes)"),
            )
        }
    };
    journal.record(entry.with_method(method));
}

fn reject(
    journal: &AuditLog,
    method: &Method,
    request_url: String,
    error: InterceptError,
) -> Response<ProxyBody> {
    let status = error.status();
    if status.is_server_error() {
        warn!(url = %request_url, error = %error, "Request failed");
    } else {
        info!(url = %request_url, error = %error, "Request rejected");
    }

    metrics::record_request(method.as_str(), "error");
    metrics::record_error(error.kind(), status.as_u16());
    journal.record(
        NewLogEntry::error(&request_url, error.journal_detail()).with_method(method.as_str()),
    );

    let mut response = text_response(status, error.to_string());
    if status == StatusCode::METHOD_NOT_ALLOWED {
        response.set_header(
            &hyper::header::ALLOW,
            &HeaderValue::from_static("GET, POST, PUT, HEAD"),
        );
    }
    response
}
