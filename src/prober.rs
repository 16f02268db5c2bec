use crate::ports::{self, ProbeStyle};
use crate::report::now_rfc3339;
use crate::types::{PortStatus, ProbeReport, ProbeResult, ProbeTarget, TlsSummary};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Timeouts and read bounds for a probe pass.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub connect_timeout: Duration,
    /// Bound on each handshake, write and read after the connect succeeded.
    pub read_timeout: Duration,
    pub http_read_size: usize,
    pub passive_read_size: usize,
    /// Ports that get an HTTP GET; every other open port is read passively.
    pub http_ports: Vec<u16>,
    /// HTTP ports where the GET goes over TLS.
    pub tls_ports: Vec<u16>,
    /// Off: send the GET in plaintext on the TLS ports too.
    pub tls: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(3),
            http_read_size: 4096,
            passive_read_size: 512,
            http_ports: ports::http_ports(),
            tls_ports: ports::tls_ports(),
            tls: true,
        }
    }
}

impl ProbeConfig {
    /// Default config with both timeouts set to `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            read_timeout: timeout,
            ..Self::default()
        }
    }

    pub fn style_for(&self, port: u16) -> ProbeStyle {
        let tls_ports: &[u16] = if self.tls { &self.tls_ports } else { &[] };
        ports::probe_style(port, &self.http_ports, tls_ports)
    }
}

/// Probe every port of `target` one after another.
///
/// - Each port gets a TCP connect bounded by `connect_timeout`; failures become `Closed`.
/// - HTTP-like ports get a `GET / HTTP/1.0` and up to `http_read_size` bytes of reply.
/// - Other open ports are read passively, up to `passive_read_size` bytes.
/// - Results keep the target's port order. Nothing here fails the whole pass.
pub async fn probe_target(target: &ProbeTarget, cfg: &ProbeConfig) -> ProbeReport {
    let started_at = now_rfc3339();
    let host = target.host();
    info!(%host, ports = ?target.ports(), "probing target");

    let mut results = Vec::with_capacity(target.ports().len());
    for &port in target.ports() {
        results.push(probe_port(host, port, cfg).await);
    }

    let open_count = results.iter().filter(|r| r.status.is_open()).count() as u64;
    info!(%host, open = open_count, "probe pass finished");
    ProbeReport {
        host: host.to_string(),
        started_at,
        open_count,
        results,
    }
}

/// Probe a single port. The socket never outlives this call.
pub async fn probe_port(host: IpAddr, port: u16, cfg: &ProbeConfig) -> ProbeResult {
    let addr = SocketAddr::new(host, port);
    let start = Instant::now();
    let mut stream = match time::timeout(cfg.connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => {
            debug!(%addr, error = %e, "connect failed");
            return ProbeResult::closed(port);
        }
        Err(_) => {
            debug!(%addr, "connect timed out");
            return ProbeResult::closed(port);
        }
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    let (banner, tls) = match cfg.style_for(port) {
        ProbeStyle::HttpGet => (http_get(&mut stream, host, cfg).await, None),
        ProbeStyle::TlsHttpGet => tls_http_get(stream, host, cfg).await,
        ProbeStyle::Passive => (
            read_bounded(&mut stream, cfg.passive_read_size, cfg.read_timeout).await,
            None,
        ),
    };

    let status = if banner.is_some() {
        PortStatus::OpenWithBanner
    } else {
        PortStatus::Open
    };
    debug!(%addr, ?status, latency_ms, "port open");
    ProbeResult {
        port,
        status,
        latency_ms: Some(latency_ms),
        banner,
        tls,
    }
}

/// Minimal HTTP/1.0 request for the gateway's root page.
pub fn http_request(host: IpAddr) -> String {
    format!("GET / HTTP/1.0\r\nHost: {}\r\n\r\n", host_header(host))
}

fn host_header(host: IpAddr) -> String {
    match host {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    }
}

async fn http_get<S>(stream: &mut S, host: IpAddr, cfg: &ProbeConfig) -> Option<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let req = http_request(host);
    match time::timeout(cfg.read_timeout, stream.write_all(req.as_bytes())).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            debug!(error = %e, "failed to send HTTP request");
            return None;
        }
        Err(_) => {
            debug!("HTTP request write timed out");
            return None;
        }
    }
    read_bounded(stream, cfg.http_read_size, cfg.read_timeout).await
}

/// One read of at most `max` bytes. Empty reads, errors and timeouts give `None`.
async fn read_bounded<S>(stream: &mut S, max: usize, timeout: Duration) -> Option<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; max];
    match time::timeout(timeout, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            buf.truncate(n);
            Some(buf)
        }
        _ => None,
    }
}

async fn tls_http_get(
    stream: TcpStream,
    host: IpAddr,
    cfg: &ProbeConfig,
) -> (Option<Vec<u8>>, Option<TlsSummary>) {
    // Gateways ship self-signed certificates; we only want to see what they present.
    let connector = match native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
    {
        Ok(c) => tokio_native_tls::TlsConnector::from(c),
        Err(e) => {
            warn!(error = %e, "failed to build TLS connector");
            return (None, None);
        }
    };

    let domain = host.to_string();
    let mut tls = match time::timeout(cfg.read_timeout, connector.connect(&domain, stream)).await {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => {
            debug!(%host, error = %e, "TLS handshake failed");
            return (None, None);
        }
        Err(_) => {
            debug!(%host, "TLS handshake timed out");
            return (None, None);
        }
    };

    let summary = peer_summary(&tls);
    let banner = http_get(&mut tls, host, cfg).await;
    (banner, summary)
}

fn peer_summary(stream: &tokio_native_tls::TlsStream<TcpStream>) -> Option<TlsSummary> {
    let cert = stream.get_ref().peer_certificate().ok()??;
    let der = cert.to_der().ok()?;
    let (_, x509) = x509_parser::parse_x509_certificate(&der).ok()?;
    Some(TlsSummary {
        subject: x509.subject().to_string(),
        issuer: x509.issuer().to_string(),
    })
}
