//! DNS SRV discovery of client connect targets (RFC 6120 Section 3.2.1).
//!
//! The resolved targets are meant to be fed into
//! [`ServerEndpoint::apply_target`](crate::ServerEndpoint::apply_target) one
//! connection attempt at a time, leaving the configured host untouched.
//!
//! 1. Query `_xmpp-client._tcp.{host}` (or `_xmpps-client._tcp.{host}` for
//!    direct TLS, XEP-0368)
//! 2. Sort by priority (ascending), then weight (descending)
//! 3. Fall back to the configured host and port when no SRV records exist
//!
//! SRV records whose only target is `.` mean the service is decidedly not
//! available at that domain; no fallback is attempted then.

use std::sync::Arc;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::rdata::SRV;
use hickory_resolver::proto::ProtoErrorKind;
use hickory_resolver::{ResolveError, ResolveErrorKind, Resolver};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::endpoint::ServerEndpoint;

/// Default XMPP C2S port as per RFC 6120.
pub const DEFAULT_CLIENT_PORT: u16 = 5222;

/// Conventional port for direct TLS client connections.
pub const DEFAULT_DIRECT_TLS_PORT: u16 = 5223;

/// DNS resolution errors.
#[derive(Debug, Error)]
pub enum DnsError {
    /// No records found for the host.
    #[error("no DNS records found for host: {0}")]
    NoRecords(String),

    /// SRV records announce that the service is not offered.
    #[error("XMPP client service not available at {0}")]
    ServiceUnavailable(String),

    /// Host resolution failed.
    #[error("DNS resolution failed for {host}: {message}")]
    ResolutionFailed { host: String, message: String },
}

/// A candidate connect address for a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The hostname or IP address.
    pub host: String,
    /// The port number.
    pub port: u16,
    /// The SRV priority (lower is higher priority).
    pub priority: u16,
    /// The SRV weight (higher gets more traffic within same priority).
    pub weight: u16,
}

impl ResolvedTarget {
    /// Create a new resolved target.
    pub fn new(host: String, port: u16, priority: u16, weight: u16) -> Self {
        Self {
            host,
            port,
            priority,
            weight,
        }
    }

    /// The configured address of an endpoint, used when SRV yields nothing.
    pub fn fallback(endpoint: &ServerEndpoint) -> Self {
        Self::new(endpoint.host().to_string(), endpoint.port(), 0, 0)
    }
}

/// SRV owner name to query for a host.
pub fn srv_service_name(host: &str, direct_tls: bool) -> String {
    if direct_tls {
        format!("_xmpps-client._tcp.{}", host)
    } else {
        format!("_xmpp-client._tcp.{}", host)
    }
}

/// Order targets by priority (ascending), then weight (descending).
pub fn sort_targets(targets: &mut [ResolvedTarget]) {
    targets.sort_by(|a, b| match a.priority.cmp(&b.priority) {
        std::cmp::Ordering::Equal => b.weight.cmp(&a.weight),
        other => other,
    });
}

/// Turn an SRV target name into a host, dropping the "no service" root target.
fn srv_target_host(target: &str) -> Option<&str> {
    let host = target.trim_end_matches('.');
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Type alias for the Tokio-based resolver.
pub type TokioResolver = Resolver<TokioConnectionProvider>;

/// SRV resolver for client connections.
#[derive(Clone)]
pub struct ClientSrvResolver {
    resolver: Arc<TokioResolver>,
}

impl ClientSrvResolver {
    /// Create a resolver with the default DNS configuration.
    pub fn new() -> Self {
        let resolver = Resolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        )
        .build();
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Create a resolver with custom configuration.
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        let resolver = Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Resolve connect targets for an endpoint's configured host.
    ///
    /// Direct TLS SRV records are queried when the endpoint uses old style
    /// SSL. Returns targets in connection order.
    #[instrument(skip(self, endpoint), name = "dns.resolve_client", fields(host = %endpoint.host()))]
    pub async fn resolve(&self, endpoint: &ServerEndpoint) -> Result<Vec<ResolvedTarget>, DnsError> {
        let srv_name = srv_service_name(endpoint.host(), endpoint.old_style_ssl);
        debug!(srv_name = %srv_name, "Resolving XMPP client SRV records");

        match self.resolver.srv_lookup(srv_name.as_str()).await {
            Ok(srv_response) => {
                let records: Vec<&SRV> = srv_response.iter().collect();
                match process_srv_records(&records) {
                    SrvTargets::Targets(targets) => {
                        debug!(count = targets.len(), "Resolved XMPP client targets via SRV");
                        Ok(targets)
                    }
                    SrvTargets::Unavailable => {
                        debug!("SRV records announce no service");
                        Err(DnsError::ServiceUnavailable(endpoint.host().to_string()))
                    }
                    SrvTargets::Empty => {
                        debug!("SRV lookup returned no records, using configured host");
                        self.resolve_fallback(endpoint).await
                    }
                }
            }
            Err(e) => {
                if is_no_records_error(&e) {
                    debug!("No SRV records exist, using configured host");
                } else {
                    warn!(error = %e, "SRV lookup failed, using configured host");
                }
                self.resolve_fallback(endpoint).await
            }
        }
    }

    /// Check that the configured host resolves and return it as the only target.
    async fn resolve_fallback(
        &self,
        endpoint: &ServerEndpoint,
    ) -> Result<Vec<ResolvedTarget>, DnsError> {
        let host = endpoint.host();
        match self.resolver.lookup_ip(host).await {
            Ok(response) => {
                if response.iter().next().is_none() {
                    return Err(DnsError::NoRecords(host.to_string()));
                }
                Ok(vec![ResolvedTarget::fallback(endpoint)])
            }
            Err(e) => {
                warn!(error = %e, host = %host, "Fallback A/AAAA lookup failed");
                Err(DnsError::ResolutionFailed {
                    host: host.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

impl Default for ClientSrvResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of interpreting an SRV answer.
#[derive(Debug, PartialEq, Eq)]
enum SrvTargets {
    /// Usable targets in connection order
    Targets(Vec<ResolvedTarget>),
    /// Only `.` targets: the service is not offered
    Unavailable,
    /// No records at all
    Empty,
}

fn process_srv_records(records: &[&SRV]) -> SrvTargets {
    if records.is_empty() {
        return SrvTargets::Empty;
    }

    let mut targets: Vec<ResolvedTarget> = records
        .iter()
        .filter_map(|srv| {
            let target = srv.target().to_utf8();
            let host = srv_target_host(&target)?;
            Some(ResolvedTarget::new(
                host.to_string(),
                srv.port(),
                srv.priority(),
                srv.weight(),
            ))
        })
        .collect();

    if targets.is_empty() {
        return SrvTargets::Unavailable;
    }

    sort_targets(&mut targets);
    SrvTargets::Targets(targets)
}

/// In hickory-resolver 0.25, NoRecordsFound is in ProtoErrorKind.
fn is_no_records_error(error: &ResolveError) -> bool {
    if let ResolveErrorKind::Proto(proto_error) = error.kind() {
        matches!(proto_error.kind(), ProtoErrorKind::NoRecordsFound { .. })
    } else {
        false
    }
}
