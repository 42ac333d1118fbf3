//! Compilation context ownership.

use oclc_runtime::{status, ComputeRuntime, RuntimeError};
use tracing::debug;

use crate::error::BuildError;

/// One runtime context bound to an ordered, non-empty set of devices.
///
/// The native context is released when this value is dropped. Programs,
/// queues and buffers created from it borrow it, so the borrow checker keeps
/// them from outliving the context.
pub struct CompilationContext<'r, R: ComputeRuntime> {
    runtime: &'r R,
    devices: Vec<R::Device>,
    handle: R::Context,
}

impl<'r, R: ComputeRuntime> CompilationContext<'r, R> {
    /// Create a context binding `devices`, in order.
    pub fn create(runtime: &'r R, devices: &[R::Device]) -> Result<Self, BuildError> {
        if devices.is_empty() {
            return Err(BuildError::Context(RuntimeError::new(
                "clCreateContext",
                status::INVALID_VALUE,
            )));
        }
        let handle = runtime
            .create_context(devices)
            .map_err(BuildError::Context)?;
        debug!(devices = devices.len(), "context created");
        Ok(Self {
            runtime,
            devices: devices.to_vec(),
            handle,
        })
    }

    pub fn runtime(&self) -> &'r R {
        self.runtime
    }

    /// Devices bound to this context, in creation order.
    pub fn devices(&self) -> &[R::Device] {
        &self.devices
    }

    pub fn handle(&self) -> &R::Context {
        &self.handle
    }

    /// Create a command queue on one of the bound devices.
    pub fn create_queue(&self, device: R::Device) -> Result<R::Queue, RuntimeError> {
        if !self.devices.contains(&device) {
            return Err(RuntimeError::new(
                "clCreateCommandQueue",
                status::INVALID_DEVICE,
            ));
        }
        self.runtime.create_queue(&self.handle, device)
    }
}

impl<R: ComputeRuntime> Drop for CompilationContext<'_, R> {
    fn drop(&mut self) {
        debug!(devices = self.devices.len(), "context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oclc_runtime::sim::SimRuntime;
    use oclc_runtime::DeviceClass;

    fn all_devices(rt: &SimRuntime, platform: usize) -> Vec<<SimRuntime as ComputeRuntime>::Device> {
        let p = rt.platform_ids().unwrap()[platform];
        rt.device_ids(p, DeviceClass::All).unwrap()
    }

    #[test]
    fn empty_device_list_refused() {
        let rt = SimRuntime::single_gpu();
        let err = CompilationContext::create(&rt, &[]).err().unwrap();
        assert!(matches!(err, BuildError::Context(e) if e.is(status::INVALID_VALUE)));
        assert_eq!(rt.live_handles(), 0);
    }

    #[test]
    fn mixed_platforms_refused() {
        let rt = SimRuntime::workstation();
        let devices = vec![all_devices(&rt, 0)[0], all_devices(&rt, 1)[0]];
        let err = CompilationContext::create(&rt, &devices).err().unwrap();
        assert!(matches!(err, BuildError::Context(e) if e.is(status::INVALID_DEVICE)));
    }

    #[test]
    fn runtime_refusal_is_context_error() {
        let rt = SimRuntime::single_gpu();
        rt.fail_call("clCreateContext", status::OUT_OF_HOST_MEMORY);
        let devices = all_devices(&rt, 0);
        assert!(matches!(
            CompilationContext::create(&rt, &devices),
            Err(BuildError::Context(_))
        ));
    }

    #[test]
    fn released_on_drop() {
        let rt = SimRuntime::workstation();
        let devices = all_devices(&rt, 0);
        {
            let ctx = CompilationContext::create(&rt, &devices).unwrap();
            assert_eq!(ctx.devices(), devices.as_slice());
            let _queue = ctx.create_queue(devices[1]).unwrap();
            assert_eq!(rt.live_handles(), 2);
        }
        assert_eq!(rt.live_handles(), 0);
    }

    #[test]
    fn queue_requires_bound_device() {
        let rt = SimRuntime::workstation();
        let devices = all_devices(&rt, 0);
        let ctx = CompilationContext::create(&rt, &devices[..1]).unwrap();
        let err = ctx.create_queue(devices[2]).err().unwrap();
        assert!(err.is(status::INVALID_DEVICE));
    }
}
