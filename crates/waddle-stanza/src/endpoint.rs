//! Configured XMPP server address with per-attempt connect overrides.

use tracing::debug;

use crate::resolve::ResolvedTarget;

/// Specifics of one configured XMPP server.
///
/// `host` and `port` are what the user configured and never change. The
/// transport layer may point individual connection attempts elsewhere (for
/// example at an SRV-discovered host) through the connect overrides, and can
/// always fall back to the configured address.
///
/// There is no internal locking: mutation needs `&mut`, so a shared endpoint
/// must be wrapped by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    host: String,
    port: u16,
    connect_server: Option<String>,
    connect_port: Option<u16>,
    /// Use TLS for the connection
    pub ssl: bool,
    /// TLS from the first byte (direct TLS) instead of STARTTLS
    pub old_style_ssl: bool,
    /// Accept self-signed server certificates
    pub self_signed_cert: bool,
    /// Authenticate with OAuth (used for Google Talk accounts)
    pub oauth: bool,
}

impl ServerEndpoint {
    /// Create an endpoint for a configured host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_server: None,
            connect_port: None,
            ssl: false,
            old_style_ssl: false,
            self_signed_cert: false,
            oauth: false,
        }
    }

    /// The configured host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Host to connect to: the override if set, else the configured host.
    pub fn connect_server(&self) -> &str {
        self.connect_server.as_deref().unwrap_or(&self.host)
    }

    /// Port to connect to: the override if set, else the configured port.
    pub fn connect_port(&self) -> u16 {
        self.connect_port.unwrap_or(self.port)
    }

    /// Override the host used for connecting.
    pub fn update_connect_server(&mut self, server: impl Into<String>) {
        let server = server.into();
        debug!(host = %self.host, connect_server = %server, "Updating connect server");
        self.connect_server = Some(server);
    }

    /// Override the port used for connecting.
    pub fn update_connect_port(&mut self, port: u16) {
        debug!(host = %self.host, connect_port = port, "Updating connect port");
        self.connect_port = Some(port);
    }

    /// Point the next connection attempt at a resolved target.
    pub fn apply_target(&mut self, target: &ResolvedTarget) {
        self.update_connect_server(target.host.clone());
        self.update_connect_port(target.port);
    }

    /// Drop both overrides, going back to the configured address.
    pub fn reset_connect_target(&mut self) {
        self.connect_server = None;
        self.connect_port = None;
    }

    /// Whether either connect value currently differs from configuration.
    pub fn is_overridden(&self) -> bool {
        self.connect_server.is_some() || self.connect_port.is_some()
    }
}
