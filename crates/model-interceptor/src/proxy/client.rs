//! HTTP client creation and configuration.
//!
//! One pooled client is shared by rule-target fetches and the transparent
//! proxy fallback.

use crate::config::UpstreamClientConfig;
use http_body_util::Empty;
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Type alias for the outbound HTTP client. Outbound requests are bodiless GETs.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Create a shared HTTP client with connection pooling.
pub fn create_http_client(config: &UpstreamClientConfig) -> std::io::Result<HttpClient> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(Duration::from_secs(config.keepalive_timeout_secs)));
    http_connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    let tls = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            warn!(
                "No native root certificates available ({}); HTTPS upstreams will fail verification",
                e
            );
            hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(empty_roots_config()?)
        }
    };
    let https_connector = tls
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    let http_client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .build(https_connector);

    info!(
        "Outbound client configured: max_idle={}, idle_timeout={}s, connect_timeout={}s, request_timeout={}s",
        config.max_idle_per_host,
        config.idle_timeout_secs,
        config.connect_timeout_secs,
        config.request_timeout_secs
    );

    Ok(http_client)
}

fn empty_roots_config() -> std::io::Result<rustls::ClientConfig> {
    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(std::io::Error::other)?
    .with_root_certificates(rustls::RootCertStore::empty())
    .with_no_client_auth();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_http_client() {
        assert!(create_http_client(&UpstreamClientConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_roots_config() {
        assert!(empty_roots_config().is_ok());
    }
}
