//! ProxyServer struct and main run loop.
//!
//! Accepts connections on the interception listener and serves each one on its
//! own task.

use super::context::InterceptorState;
use super::handler::handle_request;
use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// The interception server.
pub struct ProxyServer {
    addr: SocketAddr,
    state: Arc<InterceptorState>,
}

impl ProxyServer {
    pub fn new(addr: SocketAddr, state: Arc<InterceptorState>) -> Self {
        Self { addr, state }
    }

    /// Bind the configured address and serve until the task is dropped.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind interception listener on {}", self.addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        let local_addr = listener.local_addr()?;
        info!("Intercepting on http://{}", local_addr);
        info!(
            "Mode: {}, content root: {}",
            self.state.mode.as_str(),
            self.state.sandbox.root().display()
        );

        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { handle_request(&state, req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}
