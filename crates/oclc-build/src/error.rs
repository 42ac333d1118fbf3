//! Build pipeline errors.

use std::path::PathBuf;

use oclc_runtime::RuntimeError;
use thiserror::Error;

/// Errors that terminate a compile attempt.
///
/// None of these is retried; each surfaces straight to the caller.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("platform/device discovery failed: {0}")]
    Discovery(RuntimeError),

    #[error("platform index {index} out of range ({available} platform(s) found)")]
    PlatformIndex { index: usize, available: usize },

    #[error("device index {index} out of range ({available} device(s) found)")]
    DeviceIndex { index: usize, available: usize },

    #[error("no matching devices on the selected platform")]
    NoDevices,

    #[error("please specify one or more source files")]
    NoSources,

    #[error("context creation failed: {0}")]
    Context(RuntimeError),

    #[error("program creation failed: {0}")]
    ProgramCreation(RuntimeError),

    /// The compiler rejected the sources. `log` is the build log of the first
    /// selected device, possibly truncated.
    #[error("{status}\n{log}")]
    BuildFailure { status: RuntimeError, log: String },

    #[error("build options rejected ({options:?}): {status}")]
    InvalidOptions { status: RuntimeError, options: String },

    #[error("{0}")]
    Runtime(RuntimeError),

    #[error("program reports {devices} bound device(s) but {sizes} binary size(s)")]
    ArtifactMismatch { devices: usize, sizes: usize },

    #[error("failed to read file: {}: {error}", path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// The runtime status behind this error, if one was reported.
    pub fn status(&self) -> Option<&RuntimeError> {
        match self {
            Self::Discovery(s)
            | Self::Context(s)
            | Self::ProgramCreation(s)
            | Self::Runtime(s)
            | Self::BuildFailure { status: s, .. }
            | Self::InvalidOptions { status: s, .. } => Some(s),
            _ => None,
        }
    }
}
