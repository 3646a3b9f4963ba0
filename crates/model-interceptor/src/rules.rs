//! Interception rules and the rule document.
//!
//! The document is persisted as camelCase JSON:
//!
//! ```json
//! {
//!   "rules": [
//!     {
//!       "id": "3f1c…",
//!       "title": "Llama weights",
//!       "sourceUrlPrefix": "https://example.com/models/",
//!       "target": "/data/llama.gguf",
//!       "ignoreQueryParams": true
//!     }
//!   ]
//! }
//! ```

use crate::error::{InterceptError, RuleIssue, StoreError};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default = "generate_rule_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_url_prefix: String,
    /// Local path (absolute or relative to the content root) or an http(s) URL.
    /// Older documents call this field `localFilePath`.
    #[serde(alias = "localFilePath")]
    pub target: String,
    #[serde(default = "default_ignore_query_params")]
    pub ignore_query_params: bool,
}

fn generate_rule_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_ignore_query_params() -> bool {
    true
}

impl Rule {
    pub fn new(source_url_prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: generate_rule_id(),
            title: String::new(),
            description: None,
            source_url_prefix: source_url_prefix.into(),
            target: target.into(),
            ignore_query_params: default_ignore_query_params(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_ignore_query_params(mut self, ignore: bool) -> Self {
        self.ignore_query_params = ignore;
        self
    }

    /// Whether the source prefix parses as an absolute URL.
    pub fn has_valid_prefix(&self) -> bool {
        Url::parse(&self.source_url_prefix).is_ok()
    }
}

/// The persisted rule document. Order is significant: first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleDocument {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Check every rule, reporting all problems at once.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut issues = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            if let Err(e) = Url::parse(&rule.source_url_prefix) {
                issues.push(RuleIssue {
                    index,
                    rule_id: rule.id.clone(),
                    field: "sourceUrlPrefix",
                    message: format!("'{}' is not an absolute URL: {e}", rule.source_url_prefix),
                });
            }
            if rule.target.trim().is_empty() {
                issues.push(RuleIssue {
                    index,
                    rule_id: rule.id.clone(),
                    field: "target",
                    message: "Local path or remote URL is required".to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(issues))
        }
    }
}

/// Where a matched request is served from, decided once from the target's scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local(String),
    Remote(Url),
}

/// Why a rule's target string could not become a [`Target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    Missing,
    BadUrl(String),
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TargetError::Missing);
        }
        if is_remote(raw) {
            return Url::parse(raw)
                .map(Target::Remote)
                .map_err(|_| TargetError::BadUrl(raw.to_string()));
        }
        Ok(Target::Local(raw.to_string()))
    }

    /// Human-readable description used in the journal.
    pub fn describe(&self) -> String {
        match self {
            Target::Local(path) => path.clone(),
            Target::Remote(url) => url.to_string(),
        }
    }
}

impl TargetError {
    pub fn into_intercept_error(self, rule_id: &str) -> InterceptError {
        match self {
            TargetError::Missing => InterceptError::MissingTarget(rule_id.to_string()),
            TargetError::BadUrl(url) => InterceptError::BadTargetUrl(url),
        }
    }
}

fn is_remote(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}
