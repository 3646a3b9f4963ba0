//! Admin API server.

use crate::admin_api::router::route_request;
use crate::proxy::InterceptorState;
use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Management API server
pub struct AdminApiServer {
    addr: SocketAddr,
    state: Arc<InterceptorState>,
}

impl AdminApiServer {
    pub fn new(addr: SocketAddr, state: Arc<InterceptorState>) -> Self {
        Self { addr, state }
    }

    /// Run the admin API server
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind admin API on {}", self.addr))?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!("Admin API listening on http://{}", listener.local_addr()?);

        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Admin API failed to accept connection: {}", e);
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { route_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Admin API connection error: {}", e);
                }
            });
        }
    }
}
