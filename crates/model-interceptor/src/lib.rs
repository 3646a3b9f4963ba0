//! Download interceptor: serves configured URL prefixes from local files or
//! alternate remote sources, and proxies or rejects everything else.

pub mod admin_api;
pub mod config;
pub mod delivery;
pub mod error;
pub mod journal;
pub mod logging;
pub mod matcher;
pub mod metrics;
pub mod proxy;
pub mod rules;
pub mod store;
pub mod suggest;

mod persist;

use admin_api::AdminApiServer;
use anyhow::Context;
use config::ServiceConfig;
use journal::{AuditLog, FileJournalStore};
use proxy::{InterceptorState, ProxyServer};
use std::sync::Arc;
use store::{FileRuleStore, RuleStore};
use tracing::info;

/// Run both listeners until Ctrl-C, then flush the journal.
pub async fn run(config: ServiceConfig) -> Result<(), anyhow::Error> {
    config.validate()?;

    let rules: Arc<dyn RuleStore> = Arc::new(FileRuleStore::new(&config.storage.rules_file));
    let document = rules.load().await.with_context(|| {
        format!(
            "Failed to load rules from {}",
            config.storage.rules_file.display()
        )
    })?;
    info!(
        "Loaded {} interception rules from {}",
        document.rules.len(),
        config.storage.rules_file.display()
    );

    let journal = AuditLog::spawn(
        Arc::new(FileJournalStore::new(&config.storage.journal_file)),
        config.storage.journal_capacity,
    );
    let state = Arc::new(InterceptorState::new(&config, rules, journal.clone())?);

    let proxy = ProxyServer::new(config.listen.addr()?, Arc::clone(&state));
    let admin = if config.admin.enabled {
        Some(AdminApiServer::new(config.admin.addr()?, Arc::clone(&state)))
    } else {
        None
    };

    let outcome = tokio::select! {
        result = proxy.run() => result,
        result = run_admin(admin) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping");
            Ok(())
        }
    };

    journal.flush().await;
    outcome
}

async fn run_admin(admin: Option<AdminApiServer>) -> Result<(), anyhow::Error> {
    match admin {
        Some(admin) => admin.run().await,
        None => std::future::pending().await,
    }
}
