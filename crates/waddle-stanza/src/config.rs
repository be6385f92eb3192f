//! Server entry configuration.
//!
//! A server entry is a small TOML table, typically one per account:
//!
//! ```toml
//! host = "xmpp.example.com"
//! port = 5222
//! ssl = true
//! old_style_ssl = false
//! self_signed_cert = false
//! oauth = false
//! ```
//!
//! Every key except `host` is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::endpoint::ServerEndpoint;
use crate::error::ConfigError;
use crate::resolve::{DEFAULT_CLIENT_PORT, DEFAULT_DIRECT_TLS_PORT};

/// XMPP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// XMPP server host
    pub host: String,
    /// Port (default 5222, or 5223 with old style SSL)
    pub port: Option<u16>,
    /// Whether to use TLS
    pub ssl: bool,
    /// Direct TLS instead of STARTTLS
    pub old_style_ssl: bool,
    /// Accept self-signed certificates
    pub self_signed_cert: bool,
    /// OAuth login (gmail)
    pub oauth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            ssl: true,
            old_style_ssl: false,
            self_signed_cert: false,
            oauth: false,
        }
    }
}

impl ServerConfig {
    /// Parse a server entry from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        if config.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        Ok(config)
    }

    /// Load a server entry from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(path = ?path, host = %config.host, "Loaded server configuration");
        Ok(config)
    }

    /// The port to use, applying the transport default when none is set.
    pub fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.old_style_ssl => DEFAULT_DIRECT_TLS_PORT,
            None => DEFAULT_CLIENT_PORT,
        }
    }

    /// Build the endpoint descriptor for this entry.
    pub fn into_endpoint(self) -> ServerEndpoint {
        let port = self.effective_port();
        let mut endpoint = ServerEndpoint::new(self.host, port);
        endpoint.ssl = self.ssl;
        endpoint.old_style_ssl = self.old_style_ssl;
        endpoint.self_signed_cert = self.self_signed_cert;
        endpoint.oauth = self.oauth;
        endpoint
    }
}
