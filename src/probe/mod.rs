//! Probe module for service monitoring.
//!
//! Supports HTTP, TCP port, and ICMP (IPv4/IPv6) probes. Every probe reduces
//! to a plain up/down boolean; the typed [`ProbeError`] only exists so the
//! reason can be logged before it is discarded.

mod http;
mod ping;
mod port;

pub use http::*;
pub use ping::*;
pub use port::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timeout applied to every probe kind.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status code {got}, expected {expected}")]
    UnexpectedStatus { expected: u16, got: u16 },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("command failed: {0}")]
    Command(String),
}

/// Kind of probe a check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Http,
    Ping,
    Port,
    Ipv6,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single probe target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CheckKind,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub expected_code: u16,
}

impl Check {
    /// The host to probe: `host`, or `address` when `host` is empty.
    pub fn target(&self) -> &str {
        if self.host.is_empty() {
            &self.address
        } else {
            &self.host
        }
    }
}

/// A named collection of checks, for display grouping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    pub title: String,
    #[serde(default)]
    pub checks: Vec<Check>,
}

/// Outcome of one check in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: bool,
}

/// A capability able to probe one kind of check.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Run a single attempt. `Ok(())` means the service is up.
    async fn probe(&self, check: &Check) -> Result<(), ProbeError>;
}

/// Dispatches checks to the prober for their kind.
#[derive(Clone)]
pub struct ProberSet {
    http: Arc<dyn Prober>,
    port: Arc<dyn Prober>,
    ping: Arc<dyn Prober>,
    ipv6: Arc<dyn Prober>,
}

impl ProberSet {
    /// Create the system probers with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        Ok(Self {
            http: Arc::new(HttpProber::new(timeout)?),
            port: Arc::new(PortProber::new(timeout)),
            ping: Arc::new(IcmpProber::new(IpFamily::Any, timeout)),
            ipv6: Arc::new(IcmpProber::new(IpFamily::V6, timeout)),
        })
    }

    /// Build a set from arbitrary probers, e.g. fakes in tests.
    pub fn with_probers(
        http: Arc<dyn Prober>,
        port: Arc<dyn Prober>,
        ping: Arc<dyn Prober>,
        ipv6: Arc<dyn Prober>,
    ) -> Self {
        Self { http, port, ping, ipv6 }
    }

    /// Build a set where every kind is handled by the same prober.
    pub fn uniform(prober: Arc<dyn Prober>) -> Self {
        Self::with_probers(prober.clone(), prober.clone(), prober.clone(), prober)
    }

    /// Probe a check and collapse the outcome to up/down.
    pub async fn probe(&self, check: &Check) -> bool {
        let prober = match check.kind {
            CheckKind::Http => &self.http,
            CheckKind::Port => &self.port,
            CheckKind::Ping => &self.ping,
            CheckKind::Ipv6 => &self.ipv6,
            CheckKind::Unknown => {
                tracing::debug!("Check {} has an unknown type, reporting down", check.name);
                return false;
            }
        };

        match prober.probe(check).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Probe failed for {}: {}", check.name, e);
                false
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::StaticProber;
    use super::*;

    fn check(name: &str, kind: CheckKind) -> Check {
        Check {
            name: name.to_string(),
            kind,
            ..Default::default()
        }
    }

    #[test]
    fn test_target_falls_back_to_address() {
        let mut c = check("a", CheckKind::Ping);
        c.address = "10.0.0.1".to_string();
        assert_eq!(c.target(), "10.0.0.1");
        c.host = "gateway".to_string();
        assert_eq!(c.target(), "gateway");
    }

    #[tokio::test]
    async fn test_dispatch_by_kind() {
        let up: Arc<dyn Prober> = Arc::new(StaticProber::new(["web", "ssh", "gw", "v6"]));
        let down: Arc<dyn Prober> = Arc::new(StaticProber::all_down());
        let set = ProberSet::with_probers(up.clone(), down.clone(), up.clone(), down);

        assert!(set.probe(&check("web", CheckKind::Http)).await);
        assert!(!set.probe(&check("ssh", CheckKind::Port)).await);
        assert!(set.probe(&check("gw", CheckKind::Ping)).await);
        assert!(!set.probe(&check("v6", CheckKind::Ipv6)).await);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_down() {
        let set = ProberSet::uniform(Arc::new(StaticProber::new(["mystery"])));
        assert!(!set.probe(&check("mystery", CheckKind::Unknown)).await);
    }
}
