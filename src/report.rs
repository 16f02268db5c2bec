use crate::types::{PortStatus, ProbeReport, ProbeResult};
use ::time::{format_description::well_known, OffsetDateTime};

const SNIPPET_MAX: usize = 60;

/// Render the plain-text analysis report: one block per port, blank line between blocks.
pub fn render_text(report: &ProbeReport) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for r in &report.results {
        match r.status {
            PortStatus::Closed => blocks.push(format!("Port {}: closed or unreachable", r.port)),
            PortStatus::Open | PortStatus::OpenWithBanner => {
                blocks.push(format!("Port {}: OPEN", r.port));
                if let Some(tls) = &r.tls {
                    blocks.push(format!(
                        "Port {} tls: {} (issuer: {})",
                        r.port, tls.subject, tls.issuer
                    ));
                }
                if let Some(text) = r.banner_text() {
                    blocks.push(format!("Port {} banner:\n{}", r.port, text));
                }
            }
        }
    }
    blocks.join("\n\n")
}

/// Print a compact table of the results to stdout.
pub fn print_results_table(report: &ProbeReport) {
    let port_w = 5usize;
    let status_w = "closed".len().max("open+banner".len());
    let lat_w = "latency_ms".len();

    println!(
        "\nOpen ports on {}: {} (probed: {})",
        report.host,
        report.open_count,
        report.results.len()
    );
    println!(
        "{:>port_w$}  {:<status_w$}  {:>lat_w$}  banner",
        "port", "status", "latency_ms",
    );
    println!(
        "{:-<port_w$}  {:-<status_w$}  {:-<lat_w$}  {:-<6}",
        "", "", "", "",
    );
    for r in &report.results {
        let latency = r
            .latency_ms
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>port_w$}  {:<status_w$}  {:>lat_w$}  {}",
            r.port,
            status_label(r.status),
            latency,
            banner_snippet(r),
        );
    }
}

pub fn status_label(status: PortStatus) -> &'static str {
    match status {
        PortStatus::Closed => "closed",
        PortStatus::Open => "open",
        PortStatus::OpenWithBanner => "open+banner",
    }
}

/// One-line banner preview with CR/LF escaped, cut to 60 chars.
pub fn banner_snippet(r: &ProbeResult) -> String {
    let Some(text) = r.banner_text() else {
        return String::new();
    };
    let escaped = text.replace('\n', "\\n").replace('\r', "\\r");
    escaped.chars().take(SNIPPET_MAX).collect()
}

pub fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
