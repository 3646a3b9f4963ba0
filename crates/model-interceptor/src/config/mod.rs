//! Service configuration.
//!
//! Loaded from an optional YAML file; command-line flags and `INTERCEPTOR_*`
//! environment variables override individual fields (see `main.rs`). The
//! interception rules themselves live in a separate JSON document managed by
//! the rule store.

mod listen;
mod mode;
mod storage;
mod upstream;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use listen::{AdminConfig, ListenConfig};
pub use mode::InterceptMode;
pub use storage::{InterceptionConfig, StorageConfig};
pub use upstream::UpstreamClientConfig;

use crate::journal::MAX_CAPACITY;
use crate::logging::LoggingConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub interception: InterceptionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upstream: UpstreamClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.interception.route_prefix.starts_with('/') {
            anyhow::bail!(
                "interception.route_prefix must start with '/', got '{}'",
                self.interception.route_prefix
            );
        }

        if self.admin.enabled && self.admin.port == self.listen.port && self.listen.port != 0 {
            anyhow::bail!(
                "admin.port and listen.port must differ (both are {})",
                self.listen.port
            );
        }

        if !(1..=MAX_CAPACITY).contains(&self.storage.journal_capacity) {
            anyhow::bail!(
                "storage.journal_capacity must be between 1 and {}, got {}",
                MAX_CAPACITY,
                self.storage.journal_capacity
            );
        }

        if self.upstream.request_timeout_secs == 0 {
            anyhow::bail!("upstream.request_timeout_secs must be greater than 0");
        }

        if hyper::header::HeaderValue::from_str(&self.upstream.user_agent).is_err() {
            anyhow::bail!(
                "upstream.user_agent is not a valid header value: '{}'",
                self.upstream.user_agent
            );
        }

        Ok(())
    }
}
