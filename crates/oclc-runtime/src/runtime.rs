//! The runtime trait every backend implements.

use std::fmt;

use crate::args::KernelArg;
use crate::device::{DeviceClass, InfoParam};
use crate::error::Result;

/// An OpenCL-compatible compute runtime.
///
/// Platform and device handles are plain copyable ids owned by the runtime.
/// Every other associated type owns one native resource and releases it when
/// dropped, so a value going out of scope on any path (including `?`) never
/// leaks. Callers drop dependent resources first: programs, kernels, buffers
/// and queues before the context they were created from.
///
/// Every call is blocking and returns only on completion or failure.
pub trait ComputeRuntime {
    type Platform: Copy + fmt::Debug;
    type Device: Copy + PartialEq + fmt::Debug;
    type Context;
    type Program;
    type Queue;
    type Buffer;
    type Kernel;

    // Discovery

    /// Every platform installed, in enumeration order.
    fn platform_ids(&self) -> Result<Vec<Self::Platform>>;

    fn platform_info(&self, platform: Self::Platform, param: InfoParam) -> Result<String>;

    /// Devices of `platform` matching `class`, in enumeration order.
    ///
    /// Like `clGetDeviceIDs`, an empty match is reported as `CL_DEVICE_NOT_FOUND`.
    fn device_ids(&self, platform: Self::Platform, class: DeviceClass) -> Result<Vec<Self::Device>>;

    fn device_info(&self, device: Self::Device, param: InfoParam) -> Result<String>;

    // Compilation

    /// Create a context binding `devices`, which must all belong to one platform.
    fn create_context(&self, devices: &[Self::Device]) -> Result<Self::Context>;

    /// Create a program from source files' raw bytes; order is preserved.
    ///
    /// Bytes are passed through unchanged. Whether a source set is acceptable
    /// (encoding included) is the runtime's call.
    fn create_program_with_source(
        &self,
        context: &Self::Context,
        sources: &[Vec<u8>],
    ) -> Result<Self::Program>;

    /// Create a program for one device from a binary previously extracted
    /// with [`program_binaries`](Self::program_binaries).
    fn create_program_with_binary(
        &self,
        context: &Self::Context,
        device: Self::Device,
        binary: &[u8],
    ) -> Result<Self::Program>;

    /// Build `program` for exactly `devices`, passing `options` verbatim.
    fn build_program(
        &self,
        program: &Self::Program,
        devices: &[Self::Device],
        options: &str,
    ) -> Result<()>;

    /// Build log recorded for `device` by the last build.
    fn build_log(&self, program: &Self::Program, device: Self::Device) -> Result<String>;

    /// Number of devices bound to the program (its context's devices).
    fn program_num_devices(&self, program: &Self::Program) -> Result<usize>;

    /// Binary size per bound device, positionally matching the bound devices.
    /// Zero for a device the program was not built for.
    fn program_binary_sizes(&self, program: &Self::Program) -> Result<Vec<usize>>;

    /// Fill caller-allocated buffers with every device binary in one call.
    ///
    /// `buffers` has one slot per bound device; `None` slots are skipped.
    fn program_binaries(
        &self,
        program: &Self::Program,
        buffers: &mut [Option<Vec<u8>>],
    ) -> Result<()>;

    // Execution

    fn create_queue(&self, context: &Self::Context, device: Self::Device) -> Result<Self::Queue>;

    /// Create a read-write device buffer of `len` bytes.
    fn create_buffer(&self, context: &Self::Context, len: usize) -> Result<Self::Buffer>;

    /// Blocking write of `data` to the start of `buffer`.
    fn write_buffer(&self, queue: &Self::Queue, buffer: &Self::Buffer, data: &[u8]) -> Result<()>;

    /// Blocking read from the start of `buffer` into `out`.
    fn read_buffer(&self, queue: &Self::Queue, buffer: &Self::Buffer, out: &mut [u8])
        -> Result<()>;

    fn create_kernel(&self, program: &Self::Program, name: &str) -> Result<Self::Kernel>;

    fn set_kernel_arg(
        &self,
        kernel: &Self::Kernel,
        index: u32,
        arg: &KernelArg<'_, Self::Buffer>,
    ) -> Result<()>;

    /// Enqueue `kernel` as a single work-item.
    fn enqueue_task(&self, queue: &Self::Queue, kernel: &Self::Kernel) -> Result<()>;

    /// Flush and wait for every command on `queue`.
    fn finish(&self, queue: &Self::Queue) -> Result<()>;
}
