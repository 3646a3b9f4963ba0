//! Journal entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }
}

/// One request outcome as persisted in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request_url: String,
    /// What was served, or the error detail.
    pub served_file: String,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// The caller-supplied part of an entry; id and timestamp are assigned on record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub request_url: String,
    pub served_file: String,
    pub status: LogStatus,
    pub method: Option<String>,
}

impl NewLogEntry {
    pub fn success(request_url: impl Into<String>, served_file: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            served_file: served_file.into(),
            status: LogStatus::Success,
            method: None,
        }
    }

    pub fn error(request_url: impl Into<String>, served_file: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            served_file: served_file.into(),
            status: LogStatus::Error,
            method: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn stamp(self) -> LogEntry {
        LogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            request_url: self.request_url,
            served_file: self.served_file,
            status: self.status,
            method: self.method,
        }
    }
}
