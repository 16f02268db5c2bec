//! Simulated gateway "unlock": probe the device, then drop the analysis
//! report and two placeholder artifacts into the output directory.
//!
//! Nothing here touches the device beyond the port probe. The raw SYN
//! trigger and the firmware analysis are logged no-ops.

use crate::error::UnlockError;
use crate::prober::{self, ProbeConfig};
use crate::report::{self, now_rfc3339};
use crate::types::{ProbeReport, ProbeTarget};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ANALYSIS_FILE: &str = "router_analysis.txt";
pub const DEVICE_INFO_FILE: &str = "device_info.txt";
pub const FIRMWARE_FILE: &str = "firmware.bin";
pub const FIRMWARE_PLACEHOLDER: &[u8] = b"FAKE_FIRMWARE_DATA";

#[derive(Debug, Clone)]
pub struct UnlockConfig {
    pub out_dir: PathBuf,
    pub probe: ProbeConfig,
    /// Also write the report as pretty JSON here.
    pub json_path: Option<PathBuf>,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(".unlocker"),
            probe: ProbeConfig::default(),
            json_path: None,
        }
    }
}

/// What a finished unlock run produced.
#[derive(Debug, Clone)]
pub struct UnlockOutcome {
    pub report: ProbeReport,
    pub analysis_path: PathBuf,
    pub device_info_path: PathBuf,
    pub firmware_path: PathBuf,
}

/// Run the simulated unlock against `target`.
///
/// Only an output directory that cannot be created (or an artifact that
/// cannot be written) fails the run; closed ports are just results.
pub async fn run_unlock(
    target: &ProbeTarget,
    cfg: &UnlockConfig,
) -> Result<UnlockOutcome, UnlockError> {
    info!(host = %target.host(), out_dir = %cfg.out_dir.display(), "starting unlock attempt");
    fs::create_dir_all(&cfg.out_dir).map_err(|source| UnlockError::CreateOutputDir {
        path: cfg.out_dir.clone(),
        source,
    })?;

    let report = prober::probe_target(target, &cfg.probe).await;

    let analysis_path = cfg.out_dir.join(ANALYSIS_FILE);
    write_artifact(&analysis_path, report::render_text(&report).as_bytes())?;
    info!(path = %analysis_path.display(), "router analysis saved");

    if let Some(json_path) = &cfg.json_path {
        write_json(json_path, &report)?;
        info!(path = %json_path.display(), "JSON report saved");
    }

    send_syn_trigger(target.host());

    let device_info_path = cfg.out_dir.join(DEVICE_INFO_FILE);
    let info = device_info(target.host(), &now_rfc3339());
    write_artifact(&device_info_path, info.as_bytes())?;

    let firmware_path = cfg.out_dir.join(FIRMWARE_FILE);
    write_artifact(&firmware_path, FIRMWARE_PLACEHOLDER)?;
    info!("firmware analysis simulated; no device state was changed");

    Ok(UnlockOutcome {
        report,
        analysis_path,
        device_info_path,
        firmware_path,
    })
}

/// Contents of `device_info.txt`.
pub fn device_info(host: IpAddr, attempted_at: &str) -> String {
    format!("Device IP: {host}\nUnlock attempt: {attempted_at}\n")
}

/// Placeholder for the raw TCP SYN "unlock trigger". Sends nothing.
fn send_syn_trigger(host: IpAddr) {
    info!(%host, port = 80, "raw SYN trigger is simulated; no packet sent");
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), UnlockError> {
    fs::write(path, bytes).map_err(|source| UnlockError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json(path: &Path, report: &ProbeReport) -> Result<(), UnlockError> {
    let file = File::create(path).map_err(|source| UnlockError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    })?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, report)?;
    w.flush().map_err(|source| UnlockError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    })
}
