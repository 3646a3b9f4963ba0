//! Rule matching against request URLs.
//!
//! Matching is a literal, case-sensitive string prefix test, not a structured
//! URL comparison. A prefix of `https://host/models` therefore also matches
//! `https://host/models-evil/x`; rules should end their prefix with `/` when
//! they mean a directory.

use crate::rules::{Rule, RuleDocument, Target, TargetError};
use std::sync::Arc;
use tracing::debug;

pub struct CompiledRule {
    pub id: String,
    pub rule: Arc<Rule>,
    pub target: Result<Target, TargetError>,
}

impl CompiledRule {
    /// Returns `None` when the source prefix is not an absolute URL.
    pub fn compile(rule: Rule) -> Option<Self> {
        if !rule.has_valid_prefix() {
            return None;
        }
        Some(Self {
            id: rule.id.clone(),
            target: Target::parse(&rule.target),
            rule: Arc::new(rule),
        })
    }

    pub fn matches(&self, request_url: &str) -> bool {
        let compare_url = if self.rule.ignore_query_params {
            strip_query(request_url)
        } else {
            request_url
        };
        compare_url.starts_with(&self.rule.source_url_prefix)
    }
}

/// Immutable snapshot of the rules used for one request.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn compile(document: RuleDocument) -> Self {
        let mut rules = Vec::with_capacity(document.rules.len());
        for rule in document.rules {
            let id = rule.id.clone();
            match CompiledRule::compile(rule) {
                Some(compiled) => rules.push(compiled),
                None => debug!(rule_id = %id, "Skipping rule with invalid source URL prefix"),
            }
        }
        Self { rules }
    }

    /// First rule in stored order whose prefix matches.
    pub fn find(&self, request_url: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.matches(request_url))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map(|(head, _)| head).unwrap_or(url)
}
