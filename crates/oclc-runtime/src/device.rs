//! Device classes and queryable attributes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Filter applied when enumerating the devices of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    /// Every device of the platform.
    All,
    /// The platform's default device.
    #[default]
    Default,
    /// CPU devices only.
    Cpu,
    /// GPU devices only.
    Gpu,
}

impl DeviceClass {
    /// All classes, in command-line order.
    pub const ALL: [DeviceClass; 4] = [Self::All, Self::Default, Self::Cpu, Self::Gpu];

    /// Command-line spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Default => "default",
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a device class name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device type '{0}' (expected one of: all, default, cpu, gpu)")]
pub struct ParseDeviceClassError(pub String);

impl FromStr for DeviceClass {
    type Err = ParseDeviceClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| ParseDeviceClassError(s.to_string()))
    }
}

/// String attribute queried from a platform or a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoParam {
    Name,
    Version,
}

impl InfoParam {
    /// OpenCL parameter name when queried on a platform.
    pub fn platform_label(self) -> &'static str {
        match self {
            Self::Name => "CL_PLATFORM_NAME",
            Self::Version => "CL_PLATFORM_VERSION",
        }
    }

    /// OpenCL parameter name when queried on a device.
    pub fn device_label(self) -> &'static str {
        match self {
            Self::Name => "CL_DEVICE_NAME",
            Self::Version => "CL_DEVICE_VERSION",
        }
    }
}
