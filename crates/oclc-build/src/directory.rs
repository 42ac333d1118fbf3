//! Platform and device discovery.
//!
//! Indices handed out here are positions in the lists returned by the call
//! that produced them; nothing is cached between calls.

use oclc_runtime::{status, ComputeRuntime, DeviceClass};

use crate::error::BuildError;

/// Default upper bound on enumerated platforms.
pub const DEFAULT_MAX_PLATFORMS: usize = 16;
/// Default upper bound on enumerated devices per platform.
pub const DEFAULT_MAX_DEVICES: usize = 16;

/// Enumerate at most `max_entries` platforms.
pub fn list_platforms<R: ComputeRuntime>(
    runtime: &R,
    max_entries: usize,
) -> Result<Vec<R::Platform>, BuildError> {
    let mut platforms = runtime.platform_ids().map_err(BuildError::Discovery)?;
    platforms.truncate(max_entries);
    Ok(platforms)
}

/// Enumerate at most `max_entries` devices of `platform` matching `class`.
///
/// A platform without a matching device yields an empty list.
pub fn list_devices<R: ComputeRuntime>(
    runtime: &R,
    platform: R::Platform,
    max_entries: usize,
    class: DeviceClass,
) -> Result<Vec<R::Device>, BuildError> {
    match runtime.device_ids(platform, class) {
        Ok(mut devices) => {
            devices.truncate(max_entries);
            Ok(devices)
        }
        Err(err) if err.is(status::DEVICE_NOT_FOUND) => Ok(Vec::new()),
        Err(err) => Err(BuildError::Discovery(err)),
    }
}

/// Resolve a platform index.
pub fn select_platform<P: Copy>(platforms: &[P], index: usize) -> Result<P, BuildError> {
    platforms
        .get(index)
        .copied()
        .ok_or(BuildError::PlatformIndex {
            index,
            available: platforms.len(),
        })
}

/// Resolve the devices to compile for: every device when `all` is set,
/// otherwise exactly the device at `index`.
pub fn select_devices<D: Copy>(
    devices: &[D],
    index: usize,
    all: bool,
) -> Result<Vec<D>, BuildError> {
    if devices.is_empty() {
        return Err(BuildError::NoDevices);
    }
    if all {
        return Ok(devices.to_vec());
    }
    devices
        .get(index)
        .map(|d| vec![*d])
        .ok_or(BuildError::DeviceIndex {
            index,
            available: devices.len(),
        })
}
