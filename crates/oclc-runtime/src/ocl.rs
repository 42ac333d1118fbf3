//! Runtime backed by the system OpenCL ICD loader through `ocl::core`.

use std::ffi::CString;

use ::ocl::core::{
    self, ArgVal, CommandQueue, Context, DeviceId, DeviceInfo, DeviceType, Event, Kernel, Mem,
    MemFlags, PlatformId, PlatformInfo, Program, ProgramBuildInfo, ProgramBuildInfoResult,
    ProgramInfo, ProgramInfoResult,
};

use crate::args::{KernelArg, ScalarArg};
use crate::device::{DeviceClass, InfoParam};
use crate::error::{Result, RuntimeError};
use crate::runtime::ComputeRuntime;
use crate::status;

/// The OpenCL runtime installed on this machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct OclRuntime;

impl OclRuntime {
    pub fn new() -> Self {
        Self
    }
}

/// Map an `ocl::core` error to the status reported by `call`.
///
/// Errors raised on the host side of the wrapper carry no API status; they
/// are reported as `fallback`.
fn api_error(call: &'static str, fallback: i32) -> impl Fn(core::Error) -> RuntimeError {
    move |err| {
        let code = err.api_status().map(|s| s as i32).unwrap_or(fallback);
        RuntimeError::new(call, code)
    }
}

fn device_type(class: DeviceClass) -> DeviceType {
    match class {
        DeviceClass::All => DeviceType::ALL,
        DeviceClass::Default => DeviceType::DEFAULT,
        DeviceClass::Cpu => DeviceType::CPU,
        DeviceClass::Gpu => DeviceType::GPU,
    }
}

fn program_info(program: &Program, request: ProgramInfo) -> Result<ProgramInfoResult> {
    core::get_program_info(program, request)
        .map_err(api_error("clGetProgramInfo", status::INVALID_VALUE))
}

impl ComputeRuntime for OclRuntime {
    type Platform = PlatformId;
    type Device = DeviceId;
    type Context = Context;
    type Program = Program;
    type Queue = CommandQueue;
    type Buffer = Mem;
    type Kernel = Kernel;

    fn platform_ids(&self) -> Result<Vec<PlatformId>> {
        core::get_platform_ids().map_err(api_error("clGetPlatformIDs", status::INVALID_VALUE))
    }

    fn platform_info(&self, platform: PlatformId, param: InfoParam) -> Result<String> {
        let request = match param {
            InfoParam::Name => PlatformInfo::Name,
            InfoParam::Version => PlatformInfo::Version,
        };
        core::get_platform_info(platform, request)
            .map(|info| info.to_string())
            .map_err(api_error("clGetPlatformInfo", status::INVALID_VALUE))
    }

    fn device_ids(&self, platform: PlatformId, class: DeviceClass) -> Result<Vec<DeviceId>> {
        core::get_device_ids(platform, Some(device_type(class)), None)
            .map_err(api_error("clGetDeviceIDs", status::INVALID_VALUE))
    }

    fn device_info(&self, device: DeviceId, param: InfoParam) -> Result<String> {
        let request = match param {
            InfoParam::Name => DeviceInfo::Name,
            InfoParam::Version => DeviceInfo::Version,
        };
        core::get_device_info(device, request)
            .map(|info| info.to_string())
            .map_err(api_error("clGetDeviceInfo", status::INVALID_VALUE))
    }

    fn create_context(&self, devices: &[DeviceId]) -> Result<Context> {
        core::create_context(None, devices, None, None)
            .map_err(api_error("clCreateContext", status::INVALID_VALUE))
    }

    fn create_program_with_source(&self, context: &Context, sources: &[Vec<u8>]) -> Result<Program> {
        const CALL: &str = "clCreateProgramWithSource";
        // An interior NUL cannot cross the C boundary.
        let sources = sources
            .iter()
            .map(|s| CString::new(s.as_slice()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| RuntimeError::new(CALL, status::INVALID_VALUE))?;
        core::create_program_with_source(context, &sources)
            .map_err(api_error(CALL, status::INVALID_VALUE))
    }

    fn create_program_with_binary(
        &self,
        context: &Context,
        device: DeviceId,
        binary: &[u8],
    ) -> Result<Program> {
        core::create_program_with_binary(context, &[device], &[binary])
            .map_err(api_error("clCreateProgramWithBinary", status::INVALID_BINARY))
    }

    fn build_program(&self, program: &Program, devices: &[DeviceId], options: &str) -> Result<()> {
        const CALL: &str = "clBuildProgram";
        let options = CString::new(options)
            .map_err(|_| RuntimeError::new(CALL, status::INVALID_BUILD_OPTIONS))?;
        // A failed compile comes back from `ocl::core` as a build-log error
        // with no API status attached.
        core::build_program(program, Some(devices), &options, None, None)
            .map_err(api_error(CALL, status::BUILD_PROGRAM_FAILURE))
    }

    fn build_log(&self, program: &Program, device: DeviceId) -> Result<String> {
        match core::get_program_build_info(program, device, ProgramBuildInfo::BuildLog) {
            Ok(ProgramBuildInfoResult::BuildLog(log)) => Ok(log),
            Ok(other) => Ok(other.to_string()),
            Err(err) => Err(api_error("clGetProgramBuildInfo", status::INVALID_VALUE)(err)),
        }
    }

    fn program_num_devices(&self, program: &Program) -> Result<usize> {
        match program_info(program, ProgramInfo::NumDevices)? {
            ProgramInfoResult::NumDevices(n) => Ok(n as usize),
            _ => Err(RuntimeError::new("clGetProgramInfo", status::INVALID_VALUE)),
        }
    }

    fn program_binary_sizes(&self, program: &Program) -> Result<Vec<usize>> {
        match program_info(program, ProgramInfo::BinarySizes)? {
            ProgramInfoResult::BinarySizes(sizes) => Ok(sizes),
            _ => Err(RuntimeError::new("clGetProgramInfo", status::INVALID_VALUE)),
        }
    }

    fn program_binaries(&self, program: &Program, buffers: &mut [Option<Vec<u8>>]) -> Result<()> {
        let binaries = match program_info(program, ProgramInfo::Binaries)? {
            ProgramInfoResult::Binaries(binaries) => binaries,
            _ => return Err(RuntimeError::new("clGetProgramInfo", status::INVALID_VALUE)),
        };
        if binaries.len() != buffers.len() {
            return Err(RuntimeError::new("clGetProgramInfo", status::INVALID_VALUE));
        }
        for (slot, binary) in buffers.iter_mut().zip(&binaries) {
            if let Some(buffer) = slot {
                let n = buffer.len().min(binary.len());
                buffer[..n].copy_from_slice(&binary[..n]);
            }
        }
        Ok(())
    }

    fn create_queue(&self, context: &Context, device: DeviceId) -> Result<CommandQueue> {
        core::create_command_queue(context, device, None)
            .map_err(api_error("clCreateCommandQueue", status::INVALID_VALUE))
    }

    fn create_buffer(&self, context: &Context, len: usize) -> Result<Mem> {
        unsafe { core::create_buffer::<_, u8>(context, MemFlags::new().read_write(), len, None) }
            .map_err(api_error("clCreateBuffer", status::INVALID_BUFFER_SIZE))
    }

    fn write_buffer(&self, queue: &CommandQueue, buffer: &Mem, data: &[u8]) -> Result<()> {
        unsafe {
            core::enqueue_write_buffer(
                queue,
                buffer,
                true,
                0,
                data,
                None::<Event>,
                None::<&mut Event>,
            )
        }
        .map_err(api_error("clEnqueueWriteBuffer", status::INVALID_VALUE))
    }

    fn read_buffer(&self, queue: &CommandQueue, buffer: &Mem, out: &mut [u8]) -> Result<()> {
        unsafe {
            core::enqueue_read_buffer(
                queue,
                buffer,
                true,
                0,
                out,
                None::<Event>,
                None::<&mut Event>,
            )
        }
        .map_err(api_error("clEnqueueReadBuffer", status::INVALID_VALUE))
    }

    fn create_kernel(&self, program: &Program, name: &str) -> Result<Kernel> {
        core::create_kernel(program, name)
            .map_err(api_error("clCreateKernel", status::INVALID_KERNEL_NAME))
    }

    fn set_kernel_arg(&self, kernel: &Kernel, index: u32, arg: &KernelArg<'_, Mem>) -> Result<()> {
        let result = match arg {
            KernelArg::Buffer(mem) => core::set_kernel_arg(kernel, index, ArgVal::mem(mem)),
            KernelArg::Scalar(ScalarArg::I32(v)) => core::set_kernel_arg(kernel, index, ArgVal::scalar(v)),
            KernelArg::Scalar(ScalarArg::U32(v)) => core::set_kernel_arg(kernel, index, ArgVal::scalar(v)),
            KernelArg::Scalar(ScalarArg::F32(v)) => core::set_kernel_arg(kernel, index, ArgVal::scalar(v)),
        };
        result.map_err(api_error("clSetKernelArg", status::INVALID_ARG_VALUE))
    }

    fn enqueue_task(&self, queue: &CommandQueue, kernel: &Kernel) -> Result<()> {
        unsafe {
            core::enqueue_kernel(
                queue,
                kernel,
                1,
                None,
                &[1, 1, 1],
                None,
                None::<Event>,
                None::<&mut Event>,
            )
        }
        .map_err(api_error("clEnqueueTask", status::INVALID_VALUE))
    }

    fn finish(&self, queue: &CommandQueue) -> Result<()> {
        core::flush(queue).map_err(api_error("clFlush", status::INVALID_COMMAND_QUEUE))?;
        core::finish(queue).map_err(api_error("clFinish", status::INVALID_COMMAND_QUEUE))
    }
}
