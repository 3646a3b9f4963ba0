//! Listener configuration for the interception and management servers.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    9002
}

fn default_admin_enabled() -> bool {
    true
}

fn default_admin_port() -> u16 {
    9003
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_listen_port(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: default_admin_enabled(),
            host: default_host(),
            port: default_admin_port(),
        }
    }
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr, anyhow::Error> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {host}:{port}: {e}"))
}

impl ListenConfig {
    pub fn addr(&self) -> Result<SocketAddr, anyhow::Error> {
        socket_addr(&self.host, self.port)
    }
}

impl AdminConfig {
    pub fn addr(&self) -> Result<SocketAddr, anyhow::Error> {
        socket_addr(&self.host, self.port)
    }
}
