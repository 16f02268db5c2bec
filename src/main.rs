use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use gateway_probe::error::UnlockError;
use gateway_probe::prober::ProbeConfig;
use gateway_probe::types::ProbeTarget;
use gateway_probe::unlock::{self, UnlockConfig};
use gateway_probe::{netdetect, ports, report};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

/// gateway-probe — profile local interfaces, guess the LAN gateway and probe its service ports.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gateway-probe",
    version,
    about = "Profile local interfaces, guess the LAN gateway and probe its service ports for banners.",
    long_about = None
)]
struct Cli {
    /// Target IPv4/IPv6 address. If omitted, guess `<a.b.c>.1` from the local address.
    #[arg(long)]
    target: Option<IpAddr>,

    /// Ports to probe, comma separated, ranges allowed (e.g. `80,443,8000-8010`).
    #[arg(long, conflicts_with = "ports_file")]
    ports: Option<String>,

    /// Path to ports list file (one port or range per line).
    #[arg(long = "ports-file")]
    ports_file: Option<PathBuf>,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 3000)]
    timeout_ms: u64,

    /// Banner read timeout in milliseconds. Defaults to the connect timeout.
    #[arg(long = "read-timeout-ms")]
    read_timeout_ms: Option<u64>,

    /// Directory the analysis report and artifacts are written to.
    #[arg(long = "out-dir", default_value = ".unlocker")]
    out_dir: PathBuf,

    /// Also write the probe report as pretty JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Send the HTTP probe on 443 in plaintext instead of over TLS.
    #[arg(long = "no-tls", default_value_t = false)]
    no_tls: bool,

    /// Do not prompt; proceed straight to the probe.
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,

    /// Skip the interface listing.
    #[arg(long = "skip-profile", default_value_t = false)]
    skip_profile: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut stdin = BufReader::new(tokio::io::stdin());

    println!("=== Ethernet Profiler CLI ===");
    if !cli.skip_profile {
        profile_interfaces();
    }

    let host = match resolve_target(&cli, &mut stdin).await? {
        Some(ip) => ip,
        None => {
            println!("Could not determine router IP. Exiting.");
            return Ok(ExitCode::SUCCESS);
        }
    };

    let port_list = match (&cli.ports, &cli.ports_file) {
        (Some(s), _) => ports::parse_ports_str(s).context("invalid --ports")?,
        (None, Some(path)) => ports::load_ports_from_path(path)?,
        (None, None) => ports::probe_ports(),
    };
    if port_list.is_empty() {
        anyhow::bail!("no ports to probe");
    }
    let target = ProbeTarget::with_ports(host, &port_list);

    let connect_timeout = Duration::from_millis(cli.timeout_ms);
    let cfg = UnlockConfig {
        out_dir: cli.out_dir.clone(),
        probe: ProbeConfig {
            connect_timeout,
            read_timeout: cli
                .read_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(connect_timeout),
            tls: !cli.no_tls,
            ..ProbeConfig::default()
        },
        json_path: cli.json.clone(),
    };

    println!(
        "\nThis tool will probe the device at {host} on ports {:?}, save what it finds into {} \
         and simulate a firmware unlock. No device state is changed.\n",
        target.ports(),
        cfg.out_dir.display()
    );
    if !cli.yes {
        prompt_line(&mut stdin, "Press Enter to proceed...").await?;
    }

    println!("\nAttempting to unlock device at {host}...");
    let outcome = match unlock::run_unlock(&target, &cfg).await {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", unlock_failure_message(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    report::print_results_table(&outcome.report);
    println!(
        "\nRouter analysis complete. Results saved to {}",
        outcome.analysis_path.display()
    );
    println!(
        "Placeholder artifacts written: {}, {}",
        outcome.device_info_path.display(),
        outcome.firmware_path.display()
    );
    if let Some(path) = &cfg.json_path {
        println!("Wrote JSON results to {}", path.display());
    }
    println!("(Simulation) Unlock attempt complete.");
    Ok(ExitCode::SUCCESS)
}

fn unlock_failure_message(err: &UnlockError) -> String {
    format!("Failed to unlock device: {err}")
}

fn profile_interfaces() {
    println!("Profiling Ethernet interfaces...");
    let mut ifaces = match netdetect::list_interfaces() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: failed to enumerate interfaces: {e}");
            return;
        }
    };
    netdetect::sort_for_display(&mut ifaces);
    let mut found = false;
    for iface in ifaces.iter().filter(|i| !i.is_loopback) {
        println!(
            "  {:<12} {}/{} (netmask {})",
            iface.name, iface.addr, iface.prefix_len, iface.netmask
        );
        found = true;
    }
    if !found {
        println!("No Ethernet interfaces found.");
    }
}

/// `--target` wins; otherwise guess the gateway, falling back to asking the user.
async fn resolve_target<R>(cli: &Cli, input: &mut R) -> Result<Option<IpAddr>>
where
    R: AsyncBufRead + Unpin,
{
    if let Some(ip) = cli.target {
        return Ok(Some(ip));
    }

    match netdetect::detect_local_ipv4() {
        Ok(local) => {
            println!("Detected local IP: {local}");
            let gateway = netdetect::guess_gateway(local);
            println!("Guessed router IP: {gateway}");
            return Ok(Some(IpAddr::V4(gateway)));
        }
        Err(e) => eprintln!("Warning: {e}"),
    }

    if cli.yes {
        return Ok(None);
    }
    loop {
        let line = prompt_line(input, "Enter target IP (blank to exit): ").await?;
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        match line.parse::<IpAddr>() {
            Ok(ip) => return Ok(Some(ip)),
            Err(e) => eprintln!("invalid IP {line:?}: {e}"),
        }
    }
}

/// Print `msg` and read one line from `input`. EOF gives an empty string.
async fn prompt_line<R>(input: &mut R, msg: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    stdout.write_all(msg.as_bytes()).await?;
    stdout.flush().await?;
    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(line)
}
