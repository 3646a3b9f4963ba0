//! Rule suggestion from download logs.
//!
//! Scans free-form log text for the first URL that looks like a model or
//! artifact download and proposes its directory as a `sourceUrlPrefix`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use url::Url;

lazy_static! {
    static ref DOWNLOAD_URL: Regex =
        Regex::new(r#"https?://[^\s'"]+/(?:blobs|models|files)/[^\s'"]+"#).unwrap();
}

const NOT_FOUND: &str = "No suggestion found. Please check log format for download URLs.";
const UNPARSABLE: &str = "Could not parse a valid URL from logs.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// Everything up to and including the last `/` of the matched URL.
    Prefix(String),
    /// A candidate was found but is not a valid URL.
    Unparsable,
    NotFound,
}

impl Suggestion {
    pub fn prefix(&self) -> Option<&str> {
        match self {
            Suggestion::Prefix(prefix) => Some(prefix),
            _ => None,
        }
    }

    /// Prefix on success, otherwise a short explanation.
    pub fn message(&self) -> &str {
        match self {
            Suggestion::Prefix(prefix) => prefix,
            Suggestion::Unparsable => UNPARSABLE,
            Suggestion::NotFound => NOT_FOUND,
        }
    }
}

/// Wire shape returned by the admin API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub suggested_rule: String,
    pub found: bool,
}

impl From<&Suggestion> for SuggestionResponse {
    fn from(suggestion: &Suggestion) -> Self {
        Self {
            suggested_rule: suggestion.message().to_string(),
            found: suggestion.prefix().is_some(),
        }
    }
}

pub fn suggest_rule(log: &str) -> Suggestion {
    let Some(candidate) = DOWNLOAD_URL.find(log) else {
        return Suggestion::NotFound;
    };

    match Url::parse(candidate.as_str()) {
        Ok(url) => {
            let href = url.as_str();
            let end = href.rfind('/').map(|i| i + 1).unwrap_or(href.len());
            Suggestion::Prefix(href[..end].to_string())
        }
        Err(_) => Suggestion::Unparsable,
    }
}
