use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Ports probed on the gateway, in report order.
const PROBE_PORTS: &[u16] = &[80, 443, 23, 22, 8080];

/// Ports that get an HTTP request instead of a passive read.
const HTTP_PORTS: &[u16] = &[80, 443, 8080];

/// Ports where the HTTP request goes over TLS when TLS probing is on.
const TLS_PORTS: &[u16] = &[443];

/// How an open port is interrogated for its banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStyle {
    /// Send `GET / HTTP/1.0` in plaintext and read the reply.
    HttpGet,
    /// Complete a TLS handshake, then send the same GET.
    TlsHttpGet,
    /// Send nothing, read whatever the service volunteers (SSH, Telnet).
    Passive,
}

/// The fixed gateway port list.
pub fn probe_ports() -> Vec<u16> {
    PROBE_PORTS.to_vec()
}

/// Ports answered with an HTTP GET: 80, 443, 8080.
pub fn http_ports() -> Vec<u16> {
    HTTP_PORTS.to_vec()
}

/// HTTP ports that speak TLS: 443.
pub fn tls_ports() -> Vec<u16> {
    TLS_PORTS.to_vec()
}

/// Pick the probe style for a port. A TLS port only counts if it is also an HTTP port.
pub fn probe_style(port: u16, http_ports: &[u16], tls_ports: &[u16]) -> ProbeStyle {
    if !http_ports.contains(&port) {
        ProbeStyle::Passive
    } else if tls_ports.contains(&port) {
        ProbeStyle::TlsHttpGet
    } else {
        ProbeStyle::HttpGet
    }
}

/// Parse a port list into a deduplicated list of TCP ports (1..=65535).
///
/// Entries are separated by newlines or commas. Supported entries:
/// - single port number: `80`
/// - inclusive range: `8000-8010`
/// - comments: everything after `#` on a line is ignored
/// - whitespace and blank entries are ignored
pub fn parse_ports_str(s: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (idx, raw_line) in s.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().unwrap_or("");
        for entry in line.split(',').map(str::trim) {
            if entry.is_empty() {
                continue;
            }

            if let Some((a, b)) = entry.split_once('-') {
                let start = parse_port_str(a.trim())
                    .with_context(|| format!("line {line_no}: invalid start in range: {a}"))?;
                let end = parse_port_str(b.trim())
                    .with_context(|| format!("line {line_no}: invalid end in range: {b}"))?;
                if start > end {
                    bail!("line {line_no}: invalid range {start}-{end} (start > end)");
                }
                for p in start..=end {
                    if seen.insert(p) {
                        out.push(p);
                    }
                }
                continue;
            }

            let p = parse_port_str(entry)
                .with_context(|| format!("line {line_no}: invalid port value: {entry}"))?;
            if seen.insert(p) {
                out.push(p);
            }
        }
    }

    Ok(out)
}

/// Load a port list from a file. Errors if the file cannot be read or parsed.
pub fn load_ports_from_path(path: impl AsRef<Path>) -> Result<Vec<u16>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read ports file: {}", path.as_ref().display()))?;
    parse_ports_str(&content)
}

fn parse_port_str(s: &str) -> Result<u16> {
    let val: u32 = s.parse::<u32>().map_err(|e| anyhow::anyhow!(e))?;
    if val == 0 || val > 65535 {
        bail!("port out of range: {val}");
    }
    Ok(val as u16)
}
