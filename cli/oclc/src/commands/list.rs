//! `oclc --list`: platform and device listing.

use anyhow::Result;
use oclc_build::{list_platforms, CapabilityReport, DEFAULT_MAX_PLATFORMS};
use oclc_runtime::{ComputeRuntime, DeviceClass};

/// Print every platform and its devices of `class`.
pub fn run<R: ComputeRuntime>(runtime: &R, class: DeviceClass, json: bool) -> Result<()> {
    print!("{}", render(runtime, class, json)?);
    Ok(())
}

fn render<R: ComputeRuntime>(runtime: &R, class: DeviceClass, json: bool) -> Result<String> {
    let platforms = list_platforms(runtime, DEFAULT_MAX_PLATFORMS)?;
    let report = CapabilityReport::collect(runtime, &platforms, class)?;
    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(&report)?))
    } else {
        Ok(report.to_string())
    }
}
