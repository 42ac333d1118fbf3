//! `oclc.toml` parsing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use oclc_runtime::DeviceClass;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "oclc.toml";

/// Project-level defaults for `oclc`. Every field is optional; command-line
/// flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OclcConfig {
    #[serde(default)]
    pub compile: CompileConfig,
}

/// The `[compile]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompileConfig {
    #[serde(default)]
    pub device_type: Option<DeviceClass>,
    #[serde(default)]
    pub platform: Option<usize>,
    #[serde(default)]
    pub device: Option<usize>,
    #[serde(default)]
    pub all: Option<bool>,
    /// Compiler options used when `--option` is not given.
    #[serde(default)]
    pub options: Option<String>,
}

impl OclcConfig {
    /// Search upward from `start_dir` for an `oclc.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: OclcConfig = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing oclc.toml")
    }
}
