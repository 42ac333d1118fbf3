//! Writing extracted binaries to disk.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::digest::{artifact_digest, digest_hex, ArtifactDigest};
use crate::pipeline::BinaryArtifact;

const DEFAULT_EXTENSION: &str = ".bin";

/// How output files are named.
///
/// The base name is the override when one is given, else `<stem>.bin`. When
/// more than one device is bound, every file gets a `.<device index>` suffix,
/// including index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    stem: PathBuf,
    override_name: Option<PathBuf>,
}

impl OutputNaming {
    /// An empty override counts as no override.
    pub fn new(stem: impl Into<PathBuf>, override_name: Option<PathBuf>) -> Self {
        Self {
            stem: stem.into(),
            override_name: override_name.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    pub fn file_name(&self, device_index: usize, bound_devices: usize) -> PathBuf {
        let mut name: OsString = match &self.override_name {
            Some(name) => name.clone().into_os_string(),
            None => {
                let mut name = self.stem.clone().into_os_string();
                name.push(DEFAULT_EXTENSION);
                name
            }
        };
        if bound_devices > 1 {
            name.push(format!(".{device_index}"));
        }
        PathBuf::from(name)
    }
}

/// Result of persisting one artifact.
#[derive(Debug)]
pub enum WriteOutcome {
    Written {
        device_index: usize,
        path: PathBuf,
        bytes: usize,
        digest: ArtifactDigest,
    },
    /// The device produced no binary; no file was touched.
    Skipped { device_index: usize },
    Failed {
        device_index: usize,
        path: PathBuf,
        error: io::Error,
    },
}

impl WriteOutcome {
    pub fn device_index(&self) -> usize {
        match self {
            Self::Written { device_index, .. }
            | Self::Skipped { device_index }
            | Self::Failed { device_index, .. } => *device_index,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Written { path, .. } | Self::Failed { path, .. } => Some(path),
            Self::Skipped { .. } => None,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Write every present artifact to its own file.
///
/// A failed write is logged and reported in its outcome; the remaining
/// artifacts are still attempted.
pub fn write_artifacts(artifacts: &[BinaryArtifact], naming: &OutputNaming) -> Vec<WriteOutcome> {
    let bound = artifacts.len();
    artifacts
        .iter()
        .map(|artifact| {
            let device_index = artifact.device_index;
            let Some(bytes) = artifact.bytes.as_deref().filter(|b| !b.is_empty()) else {
                return WriteOutcome::Skipped { device_index };
            };
            let path = naming.file_name(device_index, bound);
            match std::fs::write(&path, bytes) {
                Ok(()) => {
                    let digest = artifact_digest(bytes);
                    info!(
                        device = device_index,
                        path = %path.display(),
                        bytes = bytes.len(),
                        sha256 = %digest_hex(&digest),
                        "binary written"
                    );
                    WriteOutcome::Written {
                        device_index,
                        path,
                        bytes: bytes.len(),
                        digest,
                    }
                }
                Err(err) => {
                    error!(device = device_index, path = %path.display(), error = %err, "failed to write binary");
                    WriteOutcome::Failed {
                        device_index,
                        path,
                        error: err,
                    }
                }
            }
        })
        .collect()
}
