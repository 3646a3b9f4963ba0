use super::client::create_http_client;
use crate::config::{InterceptMode, ServiceConfig};
use crate::delivery::{RemoteFetcher, Sandbox};
use crate::journal::AuditLog;
use crate::store::RuleStore;
use anyhow::Context;
use std::sync::Arc;

/// Everything a request needs, shared by every connection.
pub struct InterceptorState {
    pub rules: Arc<dyn RuleStore>,
    pub journal: AuditLog,
    pub sandbox: Sandbox,
    pub fetcher: RemoteFetcher,
    pub mode: InterceptMode,
    pub route_prefix: String,
}

impl InterceptorState {
    pub fn new(
        config: &ServiceConfig,
        rules: Arc<dyn RuleStore>,
        journal: AuditLog,
    ) -> Result<Self, anyhow::Error> {
        let client = create_http_client(&config.upstream)
            .context("Failed to create outbound HTTP client")?;
        let fetcher = RemoteFetcher::new(client, &config.upstream)?;
        let sandbox = Sandbox::new(&config.interception.content_root).with_context(|| {
            format!(
                "Invalid content root {}",
                config.interception.content_root.display()
            )
        })?;

        Ok(Self {
            rules,
            journal,
            sandbox,
            fetcher,
            mode: config.interception.mode,
            route_prefix: config.interception.route_prefix.clone(),
        })
    }
}
