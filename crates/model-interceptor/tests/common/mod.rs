//! In-process harness: an interceptor, its admin API, and a mock origin,
//! each on an ephemeral 127.0.0.1 port.
#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{CONTENT_TYPE, LOCATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use model_interceptor::admin_api::AdminApiServer;
use model_interceptor::config::{InterceptMode, ServiceConfig};
use model_interceptor::journal::{AuditLog, FileJournalStore, LogEntry};
use model_interceptor::proxy::{InterceptorState, ProxyServer};
use model_interceptor::rules::{Rule, RuleDocument};
use model_interceptor::store::{FileRuleStore, RuleStore};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const ORIGIN_BODY: &[u8] = b"origin-model-bytes";
pub const TRUNCATED_PREFIX: &[u8] = b"partial-weights";

/// Mock origin server.
///
/// - `/weights/model.bin` answers 200 with [`ORIGIN_BODY`]
/// - `/unavailable` answers 503
/// - `/redirect` answers 302 to `/weights/model.bin`
/// - `/loop` redirects to itself
/// - anything else answers 404
pub async fn spawn_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let service = service_fn(|req: Request<Incoming>| async move {
                    Ok::<_, Infallible>(origin_response(req.uri().path()))
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    addr
}

/// Origin that promises a 1000-byte body, sends [`TRUNCATED_PREFIX`] and
/// closes the connection.
pub async fn spawn_truncating_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = "HTTP/1.1 200 OK\r\n\
                            Content-Type: application/octet-stream\r\n\
                            Content-Length: 1000\r\n\
                            Connection: close\r\n\r\n";
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(TRUNCATED_PREFIX).await;
                let _ = stream.flush().await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

fn origin_response(path: &str) -> Response<Full<Bytes>> {
    let builder = Response::builder();
    let builder = match path {
        "/weights/model.bin" => {
            return builder
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "application/x-model")
                .body(Full::new(Bytes::from_static(ORIGIN_BODY)))
                .unwrap();
        }
        "/unavailable" => builder.status(StatusCode::SERVICE_UNAVAILABLE),
        "/redirect" => builder
            .status(StatusCode::FOUND)
            .header(LOCATION, "/weights/model.bin"),
        "/loop" => builder.status(StatusCode::FOUND).header(LOCATION, "/loop"),
        _ => builder.status(StatusCode::NOT_FOUND),
    };
    builder.body(Full::new(Bytes::new())).unwrap()
}

pub struct Harness {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub state: Arc<InterceptorState>,
    pub content_root: TempDir,
    pub state_dir: TempDir,
}

impl Harness {
    pub async fn start(mode: InterceptMode, rules: Vec<Rule>) -> Self {
        let content_root = tempfile::tempdir().unwrap();
        let state_dir = tempfile::tempdir().unwrap();

        let mut config = ServiceConfig::default();
        config.interception.mode = mode;
        config.interception.content_root = content_root.path().to_path_buf();
        config.storage.rules_file = state_dir.path().join("config.json");
        config.storage.journal_file = state_dir.path().join("requests.log.json");
        config.upstream.request_timeout_secs = 5;
        config.upstream.max_redirects = 3;

        let store: Arc<dyn RuleStore> = Arc::new(FileRuleStore::new(&config.storage.rules_file));
        store.save(&RuleDocument::new(rules)).await.unwrap();

        let journal = AuditLog::spawn(
            Arc::new(FileJournalStore::new(&config.storage.journal_file)),
            config.storage.journal_capacity,
        );
        let state = Arc::new(InterceptorState::new(&config, store, journal).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let proxy = ProxyServer::new(addr, Arc::clone(&state));
        tokio::spawn(async move { proxy.serve(listener).await });

        let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let admin_addr = admin_listener.local_addr().unwrap();
        let admin = AdminApiServer::new(admin_addr, Arc::clone(&state));
        tokio::spawn(async move { admin.serve(admin_listener).await });

        Self {
            addr,
            admin_addr,
            state,
            content_root,
            state_dir,
        }
    }

    pub fn write_content(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.content_root.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Client that sends every request to the interceptor in absolute form.
    pub fn proxied_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(format!("http://{}", self.addr)).unwrap())
            .build()
            .unwrap()
    }

    /// Client that talks to the interceptor or admin API directly.
    pub fn direct_client(&self) -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }

    pub async fn journal(&self) -> Vec<LogEntry> {
        self.state.journal.flush().await;
        self.state.journal.list().await.unwrap()
    }
}

pub fn rule(id: &str, prefix: &str, target: &str) -> Rule {
    let mut rule = Rule::new(prefix, target);
    rule.id = id.to_string();
    rule
}
