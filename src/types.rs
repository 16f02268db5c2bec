use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::ports;

/// A host plus the ordered ports to probe on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    host: IpAddr,
    ports: Vec<u16>,
}

impl ProbeTarget {
    /// Target with the fixed default port list (80, 443, 23, 22, 8080).
    pub fn new(host: IpAddr) -> Self {
        Self::with_ports(host, &ports::probe_ports())
    }

    /// Target with a custom port list. Duplicates are dropped, first occurrence wins.
    pub fn with_ports(host: IpAddr, list: &[u16]) -> Self {
        let mut seen = std::collections::HashSet::new();
        let ports = list.iter().copied().filter(|p| seen.insert(*p)).collect();
        Self { host, ports }
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    /// Connect failed: refused, timed out or unreachable.
    Closed,
    Open,
    OpenWithBanner,
}

impl PortStatus {
    pub fn is_open(self) -> bool {
        !matches!(self, PortStatus::Closed)
    }
}

/// Summary of the certificate presented on a TLS-probed port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TlsSummary {
    pub subject: String,
    pub issuer: String,
}

/// Outcome of probing one port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub port: u16,
    pub status: PortStatus,
    pub latency_ms: Option<u64>,
    /// Raw bytes read from the service, bounded by the probe's read size.
    pub banner: Option<Vec<u8>>,
    pub tls: Option<TlsSummary>,
}

impl ProbeResult {
    pub fn closed(port: u16) -> Self {
        Self {
            port,
            status: PortStatus::Closed,
            latency_ms: None,
            banner: None,
            tls: None,
        }
    }

    /// Banner decoded as lossy UTF-8.
    pub fn banner_text(&self) -> Option<String> {
        self.banner
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// All results of one probe pass, in port-list order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProbeReport {
    pub host: String,
    pub started_at: String,
    pub open_count: u64,
    pub results: Vec<ProbeResult>,
}
