use std::path::PathBuf;
use thiserror::Error;

/// Failures of the unlock workflow. Port-level failures never show up here.
#[derive(Error, Debug)]
pub enum UnlockError {
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write JSON report: {0}")]
    Json(#[from] serde_json::Error),
}
