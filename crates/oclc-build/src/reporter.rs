//! Platform and device listing for `--list`.

use std::fmt;

use oclc_runtime::{ComputeRuntime, DeviceClass, InfoParam};
use serde::Serialize;

use crate::directory::{list_devices, DEFAULT_MAX_DEVICES};
use crate::error::BuildError;

/// Devices shown per platform.
pub const MAX_REPORTED_DEVICES: usize = 8;

const BANNER_WIDTH: usize = 80;
const BANNER_TITLE: &str = " Platform Information ";

/// Name and version of every platform and of its devices of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    pub device_class: DeviceClass,
    pub platforms: Vec<PlatformEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformEntry {
    pub index: usize,
    pub name: String,
    pub version: String,
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceEntry {
    pub index: usize,
    pub name: String,
    pub version: String,
}

impl CapabilityReport {
    /// Query every platform in `platforms` and up to
    /// [`MAX_REPORTED_DEVICES`] of its devices matching `class`.
    ///
    /// The first failed query aborts the whole report.
    pub fn collect<R: ComputeRuntime>(
        runtime: &R,
        platforms: &[R::Platform],
        class: DeviceClass,
    ) -> Result<Self, BuildError> {
        let mut entries = Vec::with_capacity(platforms.len());
        for (index, &platform) in platforms.iter().enumerate() {
            let info = |param| {
                runtime
                    .platform_info(platform, param)
                    .map_err(BuildError::Discovery)
            };
            let mut entry = PlatformEntry {
                index,
                name: info(InfoParam::Name)?,
                version: info(InfoParam::Version)?,
                devices: Vec::new(),
            };
            let devices = list_devices(runtime, platform, DEFAULT_MAX_DEVICES, class)?;
            for (index, &device) in devices.iter().take(MAX_REPORTED_DEVICES).enumerate() {
                let info = |param| {
                    runtime
                        .device_info(device, param)
                        .map_err(BuildError::Discovery)
                };
                entry.devices.push(DeviceEntry {
                    index,
                    name: info(InfoParam::Name)?,
                    version: info(InfoParam::Version)?,
                });
            }
            entries.push(entry);
        }
        Ok(Self {
            device_class: class,
            platforms: entries,
        })
    }
}

impl fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = "=".repeat((BANNER_WIDTH - BANNER_TITLE.len()) / 2);
        writeln!(f, "{side}{BANNER_TITLE}{side}")?;
        for platform in &self.platforms {
            writeln!(f, "Platform: {}", platform.index)?;
            writeln!(f, "  {}: {}", InfoParam::Name.platform_label(), platform.name)?;
            writeln!(
                f,
                "  {}: {}",
                InfoParam::Version.platform_label(),
                platform.version
            )?;
            for device in &platform.devices {
                writeln!(f, "  Device: {}", device.index)?;
                writeln!(f, "    {}: {}", InfoParam::Name.device_label(), device.name)?;
                writeln!(
                    f,
                    "    {}: {}",
                    InfoParam::Version.device_label(),
                    device.version
                )?;
            }
        }
        writeln!(f, "{}", "=".repeat(BANNER_WIDTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::list_platforms;
    use oclc_runtime::sim::{SimDevice, SimPlatform, SimRuntime};
    use oclc_runtime::status;

    fn report(rt: &SimRuntime, class: DeviceClass) -> Result<CapabilityReport, BuildError> {
        let platforms = list_platforms(rt, 16)?;
        CapabilityReport::collect(rt, &platforms, class)
    }

    #[test]
    fn renders_platforms_and_devices() {
        let rt = SimRuntime::workstation();
        let text = report(&rt, DeviceClass::All).unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "============================= Platform Information ============================="
        );
        assert_eq!(lines[0].len(), 80);
        assert_eq!(lines[1], "Platform: 0");
        assert_eq!(lines[2], "  CL_PLATFORM_NAME: Sim OpenCL");
        assert_eq!(lines[3], "  CL_PLATFORM_VERSION: OpenCL 1.2 sim");
        assert_eq!(lines[4], "  Device: 0");
        assert_eq!(lines[5], "    CL_DEVICE_NAME: Sim GPU 0");
        assert!(text.contains("  Device: 2\n    CL_DEVICE_NAME: Sim CPU\n"));
        assert!(text.contains("Platform: 1\n"));
        assert_eq!(*lines.last().unwrap(), "=".repeat(80));
    }

    #[test]
    fn class_filter_applies() {
        let rt = SimRuntime::workstation();
        let report = report(&rt, DeviceClass::Gpu).unwrap();
        assert_eq!(report.platforms[0].devices.len(), 2);
        assert!(report.platforms[1].devices.is_empty());
    }

    #[test]
    fn no_devices_still_renders_frame() {
        let rt = SimRuntime::new(vec![SimPlatform::new("Empty", "OpenCL 3.0")]);
        let text = report(&rt, DeviceClass::Gpu).unwrap().to_string();
        assert_eq!(text.lines().count(), 5);
        assert!(!text.contains("Device:"));
    }

    #[test]
    fn device_count_is_capped() {
        let mut platform = SimPlatform::new("Many", "OpenCL 1.2");
        for i in 0..12 {
            platform = platform.with_device(SimDevice::gpu(format!("GPU {i}")));
        }
        let rt = SimRuntime::new(vec![platform]);
        let report = report(&rt, DeviceClass::All).unwrap();
        assert_eq!(report.platforms[0].devices.len(), MAX_REPORTED_DEVICES);
    }

    #[test]
    fn query_failure_aborts_report() {
        let rt = SimRuntime::single_gpu();
        rt.fail_call("clGetDeviceInfo", status::INVALID_DEVICE);
        assert!(matches!(
            report(&rt, DeviceClass::All),
            Err(BuildError::Discovery(_))
        ));
    }

    #[test]
    fn serializes_to_json() {
        let rt = SimRuntime::single_gpu();
        let json = serde_json::to_value(report(&rt, DeviceClass::Default).unwrap()).unwrap();
        assert_eq!(json["device_class"], "default");
        assert_eq!(json["platforms"][0]["devices"][0]["name"], "Sim GPU 0");
    }
}
