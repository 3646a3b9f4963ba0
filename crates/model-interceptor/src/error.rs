//! Error taxonomy for request interception and rule storage.
//!
//! Every [`InterceptError`] is caught at the request boundary, mapped to an
//! HTTP status and turned into an `error` journal entry. [`StoreError`] is
//! returned synchronously to whoever reads or replaces a persisted document.

use hyper::StatusCode;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used for streaming response bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure talking to a remote source (rule target or proxied URL).
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct UpstreamFailure {
    pub url: String,
    /// Upstream status code, when a response was received at all.
    pub status: Option<u16>,
    pub reason: String,
}

impl UpstreamFailure {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            reason: reason.into(),
        }
    }

    pub fn with_status(url: impl Into<String>, status: StatusCode) -> Self {
        Self {
            url: url.into(),
            status: Some(status.as_u16()),
            reason: format!(
                "Failed to fetch: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum InterceptError {
    #[error("No matching interception rule found.")]
    NoRuleMatch,

    #[error("Invalid target URL: {0}")]
    BadTargetUrl(String),

    #[error("Access denied: target '{0}' resolves outside the content root")]
    SandboxViolation(String),

    #[error("{cause} at: {target}")]
    LocalNotFound { target: String, cause: String },

    #[error("Error fetching from remote URL: {}. Reason: {}", .0.url, .0.reason)]
    Upstream(UpstreamFailure),

    #[error("Error proxying request to: {}. Reason: {}", .0.url, .0.reason)]
    Proxy(UpstreamFailure),

    #[error("Interception rule '{0}' has no target configured")]
    MissingTarget(String),

    #[error("Method {0} is not supported")]
    MethodNotAllowed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InterceptError {
    pub fn status(&self) -> StatusCode {
        match self {
            InterceptError::NoRuleMatch => StatusCode::NOT_FOUND,
            InterceptError::BadTargetUrl(_) => StatusCode::BAD_REQUEST,
            InterceptError::SandboxViolation(_) => StatusCode::FORBIDDEN,
            InterceptError::LocalNotFound { .. } => StatusCode::NOT_FOUND,
            InterceptError::Upstream(_) | InterceptError::Proxy(_) => StatusCode::BAD_GATEWAY,
            InterceptError::MissingTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
            InterceptError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            InterceptError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `servedFile` text written to the journal for this failure.
    pub fn journal_detail(&self) -> String {
        match self {
            InterceptError::NoRuleMatch => "N/A - No matching rule".to_string(),
            InterceptError::BadTargetUrl(url) => format!("{url} (Invalid URL)"),
            InterceptError::SandboxViolation(target) => format!("{target} (Sandbox violation)"),
            InterceptError::LocalNotFound { target, cause } => format!("{target} ({cause})"),
            InterceptError::Upstream(failure) => {
                format!("{} (Fetch Error: {})", failure.url, failure.reason)
            }
            InterceptError::Proxy(failure) => {
                format!("{} (Proxy Error: {})", failure.url, failure.reason)
            }
            InterceptError::MissingTarget(rule_id) => format!("Rule {rule_id} (Missing target)"),
            InterceptError::MethodNotAllowed(method) => {
                format!("N/A - Unsupported method {method}")
            }
            InterceptError::Internal(message) => format!("N/A - {message}"),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            InterceptError::NoRuleMatch => "no_rule_match",
            InterceptError::BadTargetUrl(_) => "bad_target_url",
            InterceptError::SandboxViolation(_) => "sandbox_violation",
            InterceptError::LocalNotFound { .. } => "local_not_found",
            InterceptError::Upstream(_) => "upstream",
            InterceptError::Proxy(_) => "proxy",
            InterceptError::MissingTarget(_) => "missing_target",
            InterceptError::MethodNotAllowed(_) => "method_not_allowed",
            InterceptError::Internal(_) => "internal",
        }
    }
}

/// One rule that failed validation on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleIssue {
    pub index: usize,
    pub rule_id: String,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid configuration: {}", describe_issues(.0))]
    Validation(Vec<RuleIssue>),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize document: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

fn describe_issues(issues: &[RuleIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            format!(
                "rules[{}].{}: {}",
                issue.index, issue.field, issue.message
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(InterceptError::NoRuleMatch.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            InterceptError::BadTargetUrl("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            InterceptError::SandboxViolation("../x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            InterceptError::MissingTarget("r1".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            InterceptError::Proxy(UpstreamFailure::new("http://a/", "refused")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_no_match_journal_detail() {
        assert_eq!(
            InterceptError::NoRuleMatch.journal_detail(),
            "N/A - No matching rule"
        );
    }

    #[test]
    fn test_upstream_detail_carries_status() {
        let failure = UpstreamFailure::with_status(
            "https://mirror.example.org/model.bin",
            StatusCode::SERVICE_UNAVAILABLE,
        );
        assert_eq!(failure.status, Some(503));
        let detail = InterceptError::Upstream(failure).journal_detail();
        assert_eq!(
            detail,
            "https://mirror.example.org/model.bin (Fetch Error: Failed to fetch: 503 Service Unavailable)"
        );
    }

    #[test]
    fn test_validation_message_lists_every_issue() {
        let err = StoreError::Validation(vec![
            RuleIssue {
                index: 0,
                rule_id: "a".into(),
                field: "sourceUrlPrefix",
                message: "not an absolute URL".into(),
            },
            RuleIssue {
                index: 2,
                rule_id: "c".into(),
                field: "target",
                message: "must not be empty".into(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("rules[0].sourceUrlPrefix"));
        assert!(message.contains("rules[2].target"));
    }
}
