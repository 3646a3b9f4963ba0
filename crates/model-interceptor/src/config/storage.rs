//! Content root and persisted document locations.

use crate::config::InterceptMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterceptionConfig {
    #[serde(default)]
    pub mode: InterceptMode,
    /// Path prefix stripped before the embedded URL in forward-proxy mode.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    /// Every local target must resolve inside this directory.
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_rules_file")]
    pub rules_file: PathBuf,
    #[serde(default = "default_journal_file")]
    pub journal_file: PathBuf,
    #[serde(default = "default_journal_capacity")]
    pub journal_capacity: usize,
}

fn default_route_prefix() -> String {
    "/".to_string()
}

fn default_content_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_rules_file() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_journal_file() -> PathBuf {
    PathBuf::from("requests.log.json")
}

fn default_journal_capacity() -> usize {
    crate::journal::DEFAULT_CAPACITY
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            mode: InterceptMode::default(),
            route_prefix: default_route_prefix(),
            content_root: default_content_root(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            rules_file: default_rules_file(),
            journal_file: default_journal_file(),
            journal_capacity: default_journal_capacity(),
        }
    }
}
