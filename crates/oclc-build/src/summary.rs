//! Per-run build summary.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::digest::digest_hex;
use crate::output::WriteOutcome;

/// What one compile produced, for `--json` output and the process exit code.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub platform: usize,
    pub devices: Vec<String>,
    pub sources: Vec<PathBuf>,
    pub syntax_only: bool,
    pub duration_ms: u64,
    pub written: Vec<WrittenFile>,
    pub skipped: Vec<usize>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub device_index: usize,
    pub path: PathBuf,
    pub bytes: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub device_index: usize,
    pub path: PathBuf,
    pub error: String,
}

impl BuildSummary {
    /// Record the write outcomes of this run.
    pub fn record(&mut self, outcomes: &[WriteOutcome]) {
        for outcome in outcomes {
            match outcome {
                WriteOutcome::Written {
                    device_index,
                    path,
                    bytes,
                    digest,
                } => self.written.push(WrittenFile {
                    device_index: *device_index,
                    path: path.clone(),
                    bytes: *bytes,
                    sha256: digest_hex(digest),
                }),
                WriteOutcome::Skipped { device_index } => self.skipped.push(*device_index),
                WriteOutcome::Failed {
                    device_index,
                    path,
                    error,
                } => self.failed.push(FailedFile {
                    device_index: *device_index,
                    path: path.clone(),
                    error: error.to_string(),
                }),
            }
        }
    }

    /// Writes were attempted and every one of them failed.
    pub fn all_writes_failed(&self) -> bool {
        !self.failed.is_empty() && self.written.is_empty()
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Summary ===")?;
        writeln!(f, "Platform: {}", self.platform)?;
        for (i, name) in self.devices.iter().enumerate() {
            writeln!(f, "  Device {i}: {name}")?;
        }
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        if self.syntax_only {
            return writeln!(f, "Syntax check: PASSED");
        }
        for file in &self.written {
            writeln!(
                f,
                "  wrote {} ({} bytes, sha256 {})",
                file.path.display(),
                file.bytes,
                file.sha256
            )?;
        }
        for index in &self.skipped {
            writeln!(f, "  device {index}: no binary")?;
        }
        for file in &self.failed {
            writeln!(f, "  FAILED {}: {}", file.path.display(), file.error)?;
        }
        Ok(())
    }
}
