//! Deterministic in-process runtime.
//!
//! `SimRuntime` behaves like a small OpenCL installation without touching
//! any driver: platforms and devices are declared up front, a toy compiler
//! accepts or rejects sources, and kernels named `vecAdd` execute on the host.
//!
//! The toy compiler:
//! - refuses source bytes that are not UTF-8, or that hold a NUL, with
//!   `CL_INVALID_VALUE` at program creation;
//! - rejects option tokens outside `-D`, `-I`, `-cl-*`, `-w`, `-Werror` with
//!   `CL_INVALID_BUILD_OPTIONS`;
//! - fails the build (`CL_BUILD_PROGRAM_FAILURE`) on any `#error` line or on
//!   unbalanced braces across the concatenated sources, recording a
//!   compiler-style log per device;
//! - emits a binary of the form `SIMBIN1\n<device>\n<options>\n<source text>`,
//!   or nothing for devices declared with [`SimDevice::without_link`].
//!
//! Kernel arguments are checked against the declared parameter types, so a
//! descriptor of the wrong size is refused with `CL_INVALID_ARG_SIZE`.
//!
//! Failures can be injected per entry point with [`SimRuntime::fail_call`], and
//! [`SimRuntime::live_handles`] counts resources not yet released.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::args::{KernelArg, ScalarArg};
use crate::device::{DeviceClass, InfoParam};
use crate::error::{Result, RuntimeError};
use crate::runtime::ComputeRuntime;
use crate::status;

const BINARY_MAGIC: &[u8] = b"SIMBIN1\n";

/// Kind of a simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimDeviceKind {
    Cpu,
    Gpu,
}

/// A simulated device declaration.
#[derive(Debug, Clone)]
pub struct SimDevice {
    pub name: String,
    pub version: String,
    pub kind: SimDeviceKind,
    /// Whether builds produce a binary for this device.
    pub links: bool,
}

impl SimDevice {
    pub fn new(name: impl Into<String>, kind: SimDeviceKind) -> Self {
        Self {
            name: name.into(),
            version: "OpenCL 1.2 sim".into(),
            kind,
            links: true,
        }
    }

    pub fn cpu(name: impl Into<String>) -> Self {
        Self::new(name, SimDeviceKind::Cpu)
    }

    pub fn gpu(name: impl Into<String>) -> Self {
        Self::new(name, SimDeviceKind::Gpu)
    }

    /// Builds succeed for this device but yield a zero-size binary.
    pub fn without_link(mut self) -> Self {
        self.links = false;
        self
    }
}

/// A simulated platform declaration.
#[derive(Debug, Clone)]
pub struct SimPlatform {
    pub name: String,
    pub version: String,
    pub devices: Vec<SimDevice>,
}

impl SimPlatform {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            devices: Vec::new(),
        }
    }

    pub fn with_device(mut self, device: SimDevice) -> Self {
        self.devices.push(device);
        self
    }
}

/// Platform handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimPlatformId(usize);

/// Device handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimDeviceId {
    platform: usize,
    index: usize,
}

/// Counts one live resource until dropped.
#[derive(Debug)]
struct Lease(Rc<Cell<usize>>);

impl Lease {
    fn new(live: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self(Rc::clone(live))
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

#[derive(Debug)]
pub struct SimContext {
    devices: Vec<SimDeviceId>,
    _lease: Lease,
}

#[derive(Debug, Clone)]
struct BuildRecord {
    ok: bool,
    log: String,
    options: String,
}

#[derive(Debug)]
pub struct SimProgram {
    devices: Vec<SimDeviceId>,
    sources: Rc<Vec<String>>,
    records: RefCell<Vec<Option<BuildRecord>>>,
    _lease: Lease,
}

impl SimProgram {
    fn position(&self, device: SimDeviceId) -> Result<usize> {
        self.devices
            .iter()
            .position(|d| *d == device)
            .ok_or_else(|| RuntimeError::new("clGetProgramBuildInfo", status::INVALID_DEVICE))
    }
}

#[derive(Debug)]
pub struct SimQueue {
    _device: SimDeviceId,
    _lease: Lease,
}

#[derive(Debug)]
pub struct SimBuffer {
    data: Rc<RefCell<Vec<u8>>>,
    _lease: Lease,
}

#[derive(Debug, Clone)]
enum BoundArg {
    Buffer(Rc<RefCell<Vec<u8>>>),
    Scalar(ScalarArg),
}

#[derive(Debug)]
pub struct SimKernel {
    name: String,
    /// Declared size of each parameter, when the type is known.
    params: Vec<Option<usize>>,
    args: RefCell<Vec<Option<BoundArg>>>,
    _lease: Lease,
}

impl SimKernel {
    /// Number of arguments bound so far.
    pub fn bound_args(&self) -> usize {
        self.args.borrow().iter().filter(|a| a.is_some()).count()
    }
}

/// The simulated runtime.
#[derive(Debug)]
pub struct SimRuntime {
    platforms: Vec<SimPlatform>,
    faults: RefCell<HashMap<&'static str, i32>>,
    missing_sizes: Cell<usize>,
    live: Rc<Cell<usize>>,
}

impl SimRuntime {
    pub fn new(platforms: Vec<SimPlatform>) -> Self {
        Self {
            platforms,
            faults: RefCell::new(HashMap::new()),
            missing_sizes: Cell::new(0),
            live: Rc::new(Cell::new(0)),
        }
    }

    /// One platform with a single GPU.
    pub fn single_gpu() -> Self {
        Self::new(vec![
            SimPlatform::new("Sim OpenCL", "OpenCL 1.2 sim").with_device(SimDevice::gpu("Sim GPU 0")),
        ])
    }

    /// Two platforms: two GPUs and a CPU on the first, a CPU on the second.
    pub fn workstation() -> Self {
        Self::new(vec![
            SimPlatform::new("Sim OpenCL", "OpenCL 1.2 sim")
                .with_device(SimDevice::gpu("Sim GPU 0"))
                .with_device(SimDevice::gpu("Sim GPU 1"))
                .with_device(SimDevice::cpu("Sim CPU")),
            SimPlatform::new("Sim Portable", "OpenCL 1.2 sim")
                .with_device(SimDevice::cpu("Sim Portable CPU")),
        ])
    }

    /// Make every later call to `call` fail with `code`.
    pub fn fail_call(&self, call: &'static str, code: i32) {
        self.faults.borrow_mut().insert(call, code);
    }

    /// Make `program_binary_sizes` report `missing` fewer entries than the
    /// program has bound devices.
    pub fn drop_binary_sizes(&self, missing: usize) {
        self.missing_sizes.set(missing);
    }

    pub fn clear_faults(&self) {
        self.faults.borrow_mut().clear();
        self.missing_sizes.set(0);
    }

    /// Resources created and not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.live.get()
    }

    fn check(&self, call: &'static str) -> Result<()> {
        match self.faults.borrow().get(call) {
            Some(&code) => Err(RuntimeError::new(call, code)),
            None => Ok(()),
        }
    }

    fn device(&self, id: SimDeviceId, call: &'static str) -> Result<&SimDevice> {
        self.platforms
            .get(id.platform)
            .and_then(|p| p.devices.get(id.index))
            .ok_or_else(|| RuntimeError::new(call, status::INVALID_DEVICE))
    }

    fn binary_for(&self, program: &SimProgram, slot: usize) -> Result<Vec<u8>> {
        let records = program.records.borrow();
        let device = self.device(program.devices[slot], "clGetProgramInfo")?;
        match &records[slot] {
            Some(record) if record.ok && device.links => {
                let mut bin = BINARY_MAGIC.to_vec();
                bin.extend_from_slice(device.name.as_bytes());
                bin.push(b'\n');
                bin.extend_from_slice(record.options.as_bytes());
                bin.push(b'\n');
                bin.extend_from_slice(program.sources.join("\n").as_bytes());
                Ok(bin)
            }
            _ => Ok(Vec::new()),
        }
    }
}

fn check_options(options: &str) -> Result<()> {
    let mut tokens = options.split_whitespace();
    while let Some(token) = tokens.next() {
        let ok = match token {
            "-D" | "-I" => tokens.next().is_some(),
            "-w" | "-Werror" => true,
            t => t.starts_with("-D") || t.starts_with("-I") || t.starts_with("-cl-"),
        };
        if !ok {
            return Err(RuntimeError::new("clBuildProgram", status::INVALID_BUILD_OPTIONS));
        }
    }
    Ok(())
}

/// Compiler-style diagnostics for the concatenated sources.
fn diagnose(sources: &[String]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut depth: i64 = 0;
    for (s, source) in sources.iter().enumerate() {
        for (l, line) in source.lines().enumerate() {
            if let Some(col) = line.find("#error") {
                let message = line[col + "#error".len()..].trim();
                errors.push(format!(
                    "<source {s}>:{}:{}: error: {message}",
                    l + 1,
                    col + 1
                ));
            }
            for (c, ch) in line.char_indices() {
                match ch {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth < 0 {
                            errors.push(format!(
                                "<source {s}>:{}:{}: error: extraneous closing brace ('}}')",
                                l + 1,
                                c + 1
                            ));
                            depth = 0;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    if depth > 0 {
        errors.push(format!(
            "<source {}>: error: expected '}}' at end of input",
            sources.len().saturating_sub(1)
        ));
    }
    errors
}

/// Size in bytes of a kernel parameter declaration such as `__global float* z`
/// or `int n`, if its type is one the toy compiler knows.
fn param_size(decl: &str) -> Option<usize> {
    if decl.contains('*') {
        return Some(std::mem::size_of::<usize>());
    }
    let tokens: Vec<&str> = decl.split_whitespace().collect();
    let ty = tokens.iter().rev().nth(1)?;
    match *ty {
        "char" | "uchar" => Some(1),
        "short" | "ushort" | "half" => Some(2),
        "int" | "uint" | "float" => Some(4),
        "long" | "ulong" | "double" => Some(8),
        _ => None,
    }
}

/// Declared parameter sizes of `__kernel void <name>(...)` if declared in `text`.
fn kernel_params(text: &str, name: &str) -> Option<Vec<Option<usize>>> {
    let mut rest = text;
    while let Some(pos) = rest.find("void") {
        let before = rest[..pos].trim_end();
        let after = rest[pos + "void".len()..].trim_start();
        rest = &rest[pos + "void".len()..];
        if !before.ends_with("kernel") {
            continue;
        }
        let Some(tail) = after.strip_prefix(name) else {
            continue;
        };
        let Some(params) = tail.trim_start().strip_prefix('(') else {
            continue;
        };
        let params = &params[..params.find(')')?];
        let trimmed = params.trim();
        if trimmed.is_empty() || trimmed == "void" {
            return Some(Vec::new());
        }
        return Some(trimmed.split(',').map(param_size).collect());
    }
    None
}

fn read_f32s(bytes: &[u8], n: usize) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .take(n)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl ComputeRuntime for SimRuntime {
    type Platform = SimPlatformId;
    type Device = SimDeviceId;
    type Context = SimContext;
    type Program = SimProgram;
    type Queue = SimQueue;
    type Buffer = SimBuffer;
    type Kernel = SimKernel;

    fn platform_ids(&self) -> Result<Vec<SimPlatformId>> {
        self.check("clGetPlatformIDs")?;
        Ok((0..self.platforms.len()).map(SimPlatformId).collect())
    }

    fn platform_info(&self, platform: SimPlatformId, param: InfoParam) -> Result<String> {
        self.check("clGetPlatformInfo")?;
        let p = self
            .platforms
            .get(platform.0)
            .ok_or_else(|| RuntimeError::new("clGetPlatformInfo", status::INVALID_PLATFORM))?;
        Ok(match param {
            InfoParam::Name => p.name.clone(),
            InfoParam::Version => p.version.clone(),
        })
    }

    fn device_ids(&self, platform: SimPlatformId, class: DeviceClass) -> Result<Vec<SimDeviceId>> {
        self.check("clGetDeviceIDs")?;
        let p = self
            .platforms
            .get(platform.0)
            .ok_or_else(|| RuntimeError::new("clGetDeviceIDs", status::INVALID_PLATFORM))?;
        let matching = p.devices.iter().enumerate().filter(|(_, d)| match class {
            DeviceClass::All | DeviceClass::Default => true,
            DeviceClass::Cpu => d.kind == SimDeviceKind::Cpu,
            DeviceClass::Gpu => d.kind == SimDeviceKind::Gpu,
        });
        let limit = if class == DeviceClass::Default { 1 } else { usize::MAX };
        let ids: Vec<_> = matching
            .take(limit)
            .map(|(index, _)| SimDeviceId {
                platform: platform.0,
                index,
            })
            .collect();
        if ids.is_empty() {
            return Err(RuntimeError::new("clGetDeviceIDs", status::DEVICE_NOT_FOUND));
        }
        Ok(ids)
    }

    fn device_info(&self, device: SimDeviceId, param: InfoParam) -> Result<String> {
        self.check("clGetDeviceInfo")?;
        let d = self.device(device, "clGetDeviceInfo")?;
        Ok(match param {
            InfoParam::Name => d.name.clone(),
            InfoParam::Version => d.version.clone(),
        })
    }

    fn create_context(&self, devices: &[SimDeviceId]) -> Result<SimContext> {
        self.check("clCreateContext")?;
        let Some(first) = devices.first() else {
            return Err(RuntimeError::new("clCreateContext", status::INVALID_VALUE));
        };
        for d in devices {
            self.device(*d, "clCreateContext")?;
            if d.platform != first.platform {
                return Err(RuntimeError::new("clCreateContext", status::INVALID_DEVICE));
            }
        }
        Ok(SimContext {
            devices: devices.to_vec(),
            _lease: Lease::new(&self.live),
        })
    }

    fn create_program_with_source(&self, context: &SimContext, sources: &[Vec<u8>]) -> Result<SimProgram> {
        const CALL: &str = "clCreateProgramWithSource";
        self.check(CALL)?;
        let invalid = || RuntimeError::new(CALL, status::INVALID_VALUE);
        if sources.is_empty() {
            return Err(invalid());
        }
        let texts = sources
            .iter()
            .map(|bytes| match std::str::from_utf8(bytes) {
                Ok(text) if !text.contains('\0') => Ok(text.to_string()),
                _ => Err(invalid()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SimProgram {
            devices: context.devices.clone(),
            sources: Rc::new(texts),
            records: RefCell::new(vec![None; context.devices.len()]),
            _lease: Lease::new(&self.live),
        })
    }

    fn create_program_with_binary(
        &self,
        context: &SimContext,
        device: SimDeviceId,
        binary: &[u8],
    ) -> Result<SimProgram> {
        const CALL: &str = "clCreateProgramWithBinary";
        self.check(CALL)?;
        let slot = context
            .devices
            .iter()
            .position(|d| *d == device)
            .ok_or_else(|| RuntimeError::new(CALL, status::INVALID_DEVICE))?;
        let invalid = || RuntimeError::new(CALL, status::INVALID_BINARY);
        let body = binary.strip_prefix(BINARY_MAGIC).ok_or_else(invalid)?;
        let text = std::str::from_utf8(body).map_err(|_| invalid())?;
        let mut parts = text.splitn(3, '\n');
        let (_device_name, options, source) = match (parts.next(), parts.next(), parts.next()) {
            (Some(d), Some(o), Some(s)) => (d, o, s),
            _ => return Err(invalid()),
        };
        let mut records = vec![None; context.devices.len()];
        records[slot] = Some(BuildRecord {
            ok: true,
            log: String::new(),
            options: options.to_string(),
        });
        Ok(SimProgram {
            devices: context.devices.clone(),
            sources: Rc::new(vec![source.to_string()]),
            records: RefCell::new(records),
            _lease: Lease::new(&self.live),
        })
    }

    fn build_program(&self, program: &SimProgram, devices: &[SimDeviceId], options: &str) -> Result<()> {
        self.check("clBuildProgram")?;
        if devices.is_empty() {
            return Err(RuntimeError::new("clBuildProgram", status::INVALID_VALUE));
        }
        let slots = devices
            .iter()
            .map(|d| {
                program
                    .devices
                    .iter()
                    .position(|p| p == d)
                    .ok_or_else(|| RuntimeError::new("clBuildProgram", status::INVALID_DEVICE))
            })
            .collect::<Result<Vec<_>>>()?;
        check_options(options)?;

        let errors = diagnose(&program.sources);
        let ok = errors.is_empty();
        let log = if ok {
            String::new()
        } else {
            let mut log = errors.join("\n");
            log.push_str(&format!("\n{} error(s) generated.\n", errors.len()));
            log
        };
        let mut records = program.records.borrow_mut();
        for slot in slots {
            records[slot] = Some(BuildRecord {
                ok,
                log: log.clone(),
                options: options.to_string(),
            });
        }
        if ok {
            Ok(())
        } else {
            Err(RuntimeError::new("clBuildProgram", status::BUILD_PROGRAM_FAILURE))
        }
    }

    fn build_log(&self, program: &SimProgram, device: SimDeviceId) -> Result<String> {
        self.check("clGetProgramBuildInfo")?;
        let slot = program.position(device)?;
        Ok(program.records.borrow()[slot]
            .as_ref()
            .map(|r| r.log.clone())
            .unwrap_or_default())
    }

    fn program_num_devices(&self, program: &SimProgram) -> Result<usize> {
        self.check("clGetProgramInfo")?;
        Ok(program.devices.len())
    }

    fn program_binary_sizes(&self, program: &SimProgram) -> Result<Vec<usize>> {
        self.check("clGetProgramInfo")?;
        let reported = program.devices.len().saturating_sub(self.missing_sizes.get());
        (0..reported)
            .map(|slot| self.binary_for(program, slot).map(|b| b.len()))
            .collect()
    }

    fn program_binaries(&self, program: &SimProgram, buffers: &mut [Option<Vec<u8>>]) -> Result<()> {
        self.check("clGetProgramInfo")?;
        if buffers.len() != program.devices.len() {
            return Err(RuntimeError::new("clGetProgramInfo", status::INVALID_VALUE));
        }
        for (slot, buffer) in buffers.iter_mut().enumerate() {
            if let Some(buffer) = buffer {
                let bin = self.binary_for(program, slot)?;
                let n = buffer.len().min(bin.len());
                buffer[..n].copy_from_slice(&bin[..n]);
            }
        }
        Ok(())
    }

    fn create_queue(&self, context: &SimContext, device: SimDeviceId) -> Result<SimQueue> {
        self.check("clCreateCommandQueue")?;
        if !context.devices.contains(&device) {
            return Err(RuntimeError::new("clCreateCommandQueue", status::INVALID_DEVICE));
        }
        Ok(SimQueue {
            _device: device,
            _lease: Lease::new(&self.live),
        })
    }

    fn create_buffer(&self, _context: &SimContext, len: usize) -> Result<SimBuffer> {
        self.check("clCreateBuffer")?;
        if len == 0 {
            return Err(RuntimeError::new("clCreateBuffer", status::INVALID_BUFFER_SIZE));
        }
        Ok(SimBuffer {
            data: Rc::new(RefCell::new(vec![0; len])),
            _lease: Lease::new(&self.live),
        })
    }

    fn write_buffer(&self, _queue: &SimQueue, buffer: &SimBuffer, data: &[u8]) -> Result<()> {
        self.check("clEnqueueWriteBuffer")?;
        let mut dst = buffer.data.borrow_mut();
        if data.len() > dst.len() {
            return Err(RuntimeError::new("clEnqueueWriteBuffer", status::INVALID_VALUE));
        }
        dst[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, _queue: &SimQueue, buffer: &SimBuffer, out: &mut [u8]) -> Result<()> {
        self.check("clEnqueueReadBuffer")?;
        let src = buffer.data.borrow();
        if out.len() > src.len() {
            return Err(RuntimeError::new("clEnqueueReadBuffer", status::INVALID_VALUE));
        }
        out.copy_from_slice(&src[..out.len()]);
        Ok(())
    }

    fn create_kernel(&self, program: &SimProgram, name: &str) -> Result<SimKernel> {
        self.check("clCreateKernel")?;
        let built = program.records.borrow().iter().flatten().any(|r| r.ok);
        if !built {
            return Err(RuntimeError::new("clCreateKernel", status::INVALID_PROGRAM_EXECUTABLE));
        }
        let params = program
            .sources
            .iter()
            .find_map(|s| kernel_params(s, name))
            .ok_or_else(|| RuntimeError::new("clCreateKernel", status::INVALID_KERNEL_NAME))?;
        Ok(SimKernel {
            name: name.to_string(),
            args: RefCell::new(vec![None; params.len()]),
            params,
            _lease: Lease::new(&self.live),
        })
    }

    fn set_kernel_arg(&self, kernel: &SimKernel, index: u32, arg: &KernelArg<'_, SimBuffer>) -> Result<()> {
        self.check("clSetKernelArg")?;
        let mut args = kernel.args.borrow_mut();
        let slot = args
            .get_mut(index as usize)
            .ok_or_else(|| RuntimeError::new("clSetKernelArg", status::INVALID_ARG_INDEX))?;
        if let Some(declared) = kernel.params[index as usize] {
            if declared != arg.size() {
                return Err(RuntimeError::new("clSetKernelArg", status::INVALID_ARG_SIZE));
            }
        }
        *slot = Some(match arg {
            KernelArg::Buffer(b) => BoundArg::Buffer(Rc::clone(&b.data)),
            KernelArg::Scalar(s) => BoundArg::Scalar(*s),
        });
        Ok(())
    }

    fn enqueue_task(&self, _queue: &SimQueue, kernel: &SimKernel) -> Result<()> {
        const CALL: &str = "clEnqueueTask";
        self.check(CALL)?;
        let args = kernel
            .args
            .borrow()
            .iter()
            .cloned()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| RuntimeError::new(CALL, status::INVALID_KERNEL_ARGS))?;
        if kernel.name != "vecAdd" {
            return Ok(());
        }
        let bad_args = || RuntimeError::new(CALL, status::INVALID_KERNEL_ARGS);
        let (z, x, y, n) = match args.as_slice() {
            [BoundArg::Buffer(z), BoundArg::Buffer(x), BoundArg::Buffer(y), BoundArg::Scalar(n)] => {
                let n = match *n {
                    ScalarArg::I32(n) => usize::try_from(n).map_err(|_| bad_args())?,
                    ScalarArg::U32(n) => n as usize,
                    ScalarArg::F32(_) => return Err(bad_args()),
                };
                (z, x, y, n)
            }
            _ => return Err(bad_args()),
        };
        let xs = read_f32s(&x.borrow(), n);
        let ys = read_f32s(&y.borrow(), n);
        let mut out = z.borrow_mut();
        if xs.len() < n || ys.len() < n || out.len() < n * 4 {
            return Err(bad_args());
        }
        for (i, (a, b)) in xs.iter().zip(&ys).enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&(a + b).to_ne_bytes());
        }
        Ok(())
    }

    fn finish(&self, _queue: &SimQueue) -> Result<()> {
        self.check("clFinish")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "__kernel void k(__global float* a) { a[0] = 1.0f; }\n";

    fn gpu(rt: &SimRuntime) -> SimDeviceId {
        let p = rt.platform_ids().unwrap()[0];
        rt.device_ids(p, DeviceClass::Gpu).unwrap()[0]
    }

    #[test]
    fn device_filtering() {
        let rt = SimRuntime::workstation();
        let p = rt.platform_ids().unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(rt.device_ids(p[0], DeviceClass::All).unwrap().len(), 3);
        assert_eq!(rt.device_ids(p[0], DeviceClass::Gpu).unwrap().len(), 2);
        assert_eq!(rt.device_ids(p[0], DeviceClass::Cpu).unwrap().len(), 1);
        assert_eq!(rt.device_ids(p[0], DeviceClass::Default).unwrap().len(), 1);
        let err = rt.device_ids(p[1], DeviceClass::Gpu).unwrap_err();
        assert!(err.is(status::DEVICE_NOT_FOUND));
    }

    #[test]
    fn info_queries() {
        let rt = SimRuntime::single_gpu();
        let p = rt.platform_ids().unwrap()[0];
        assert_eq!(rt.platform_info(p, InfoParam::Name).unwrap(), "Sim OpenCL");
        let d = gpu(&rt);
        assert_eq!(rt.device_info(d, InfoParam::Name).unwrap(), "Sim GPU 0");
        assert_eq!(rt.device_info(d, InfoParam::Version).unwrap(), "OpenCL 1.2 sim");
    }

    #[test]
    fn context_rejects_empty_and_mixed_platforms() {
        let rt = SimRuntime::workstation();
        assert!(rt.create_context(&[]).unwrap_err().is(status::INVALID_VALUE));
        let p = rt.platform_ids().unwrap();
        let a = rt.device_ids(p[0], DeviceClass::Gpu).unwrap()[0];
        let b = rt.device_ids(p[1], DeviceClass::Cpu).unwrap()[0];
        assert!(rt.create_context(&[a, b]).unwrap_err().is(status::INVALID_DEVICE));
        assert_eq!(rt.live_handles(), 0);
    }

    #[test]
    fn build_and_extract_binary() {
        let rt = SimRuntime::single_gpu();
        let d = gpu(&rt);
        let ctx = rt.create_context(&[d]).unwrap();
        let program = rt.create_program_with_source(&ctx, &[VALID.as_bytes().to_vec()]).unwrap();
        rt.build_program(&program, &[d], "-DN=4 -cl-fast-relaxed-math").unwrap();
        let sizes = rt.program_binary_sizes(&program).unwrap();
        assert_eq!(sizes.len(), 1);
        let mut bufs = vec![Some(vec![0u8; sizes[0]])];
        rt.program_binaries(&program, &mut bufs).unwrap();
        let bin = bufs[0].take().unwrap();
        assert!(bin.starts_with(BINARY_MAGIC));
        assert!(String::from_utf8_lossy(&bin).contains("-DN=4"));
    }

    #[test]
    fn build_failure_records_log() {
        let rt = SimRuntime::single_gpu();
        let d = gpu(&rt);
        let ctx = rt.create_context(&[d]).unwrap();
        let src = b"__kernel void k() {\n#error unsupported target\n}\n".to_vec();
        let program = rt.create_program_with_source(&ctx, &[src]).unwrap();
        let err = rt.build_program(&program, &[d], "").unwrap_err();
        assert!(err.is(status::BUILD_PROGRAM_FAILURE));
        let log = rt.build_log(&program, d).unwrap();
        assert!(log.contains("<source 0>:2:1: error: unsupported target"));
        assert!(log.contains("1 error(s) generated."));
    }

    #[test]
    fn unbalanced_braces_fail() {
        assert_eq!(diagnose(&["__kernel void k() {".into()]).len(), 1);
        assert_eq!(diagnose(&["}".into()]).len(), 1);
        // Braces may span sources.
        assert!(diagnose(&["__kernel void k() {".into(), "}".into()]).is_empty());
    }

    #[test]
    fn option_validation() {
        assert!(check_options("").is_ok());
        assert!(check_options("-D FOO -I include -w -Werror -cl-std=CL1.2").is_ok());
        assert!(check_options("--bogus").is_err());
        assert!(check_options("-D").is_err());
    }

    #[test]
    fn unlinked_device_yields_empty_binary() {
        let rt = SimRuntime::new(vec![SimPlatform::new("p", "v")
            .with_device(SimDevice::gpu("g0"))
            .with_device(SimDevice::gpu("g1").without_link())]);
        let p = rt.platform_ids().unwrap()[0];
        let ds = rt.device_ids(p, DeviceClass::All).unwrap();
        let ctx = rt.create_context(&ds).unwrap();
        let program = rt.create_program_with_source(&ctx, &[VALID.as_bytes().to_vec()]).unwrap();
        rt.build_program(&program, &ds, "").unwrap();
        let sizes = rt.program_binary_sizes(&program).unwrap();
        assert!(sizes[0] > 0);
        assert_eq!(sizes[1], 0);
    }

    #[test]
    fn kernel_param_parsing() {
        let ptr = Some(std::mem::size_of::<usize>());
        let src = "__kernel void vecAdd(__global float* z, __global const float* x,\n  __global const float* y, int n) {}";
        assert_eq!(kernel_params(src, "vecAdd"), Some(vec![ptr, ptr, ptr, Some(4)]));
        assert_eq!(kernel_params("kernel void empty(void) {}", "empty"), Some(vec![]));
        assert_eq!(
            kernel_params("kernel void k(double d, my_t t) {}", "k"),
            Some(vec![Some(8), None])
        );
        assert_eq!(kernel_params("void helper(int a) {}", "helper"), None);
        assert_eq!(kernel_params(src, "missing"), None);
    }

    #[test]
    fn source_bytes_must_be_utf8_text() {
        let rt = SimRuntime::single_gpu();
        let d = gpu(&rt);
        let ctx = rt.create_context(&[d]).unwrap();
        let latin1 = b"// M\xfcller\n__kernel void k() {}\n".to_vec();
        let err = rt.create_program_with_source(&ctx, &[latin1]).unwrap_err();
        assert_eq!(err, RuntimeError::new("clCreateProgramWithSource", status::INVALID_VALUE));
        assert!(rt.create_program_with_source(&ctx, &[b"a\0b".to_vec()]).is_err());
        assert!(rt.create_program_with_source(&ctx, &[]).is_err());
        assert_eq!(rt.live_handles(), 1);
    }

    #[test]
    fn short_size_list() {
        let rt = SimRuntime::workstation();
        let p = rt.platform_ids().unwrap()[0];
        let ds = rt.device_ids(p, DeviceClass::All).unwrap();
        let ctx = rt.create_context(&ds).unwrap();
        let program = rt.create_program_with_source(&ctx, &[VALID.as_bytes().to_vec()]).unwrap();
        rt.build_program(&program, &ds, "").unwrap();
        rt.drop_binary_sizes(1);
        assert_eq!(rt.program_binary_sizes(&program).unwrap().len(), 2);
        assert_eq!(rt.program_num_devices(&program).unwrap(), 3);
        rt.clear_faults();
        assert_eq!(rt.program_binary_sizes(&program).unwrap().len(), 3);
    }

    #[test]
    fn binary_round_trip_through_program() {
        let rt = SimRuntime::single_gpu();
        let d = gpu(&rt);
        let ctx = rt.create_context(&[d]).unwrap();
        let program = rt.create_program_with_source(&ctx, &[VALID.as_bytes().to_vec()]).unwrap();
        rt.build_program(&program, &[d], "").unwrap();
        let size = rt.program_binary_sizes(&program).unwrap()[0];
        let mut bufs = vec![Some(vec![0u8; size])];
        rt.program_binaries(&program, &mut bufs).unwrap();
        let loaded = rt
            .create_program_with_binary(&ctx, d, bufs[0].as_deref().unwrap())
            .unwrap();
        assert!(rt.create_kernel(&loaded, "k").is_ok());
        assert!(rt
            .create_program_with_binary(&ctx, d, b"not a binary")
            .unwrap_err()
            .is(status::INVALID_BINARY));
    }

    #[test]
    fn injected_fault_and_handle_release() {
        let rt = SimRuntime::single_gpu();
        rt.fail_call("clGetPlatformIDs", status::OUT_OF_HOST_MEMORY);
        assert!(rt.platform_ids().unwrap_err().is(status::OUT_OF_HOST_MEMORY));
        rt.clear_faults();
        let d = gpu(&rt);
        {
            let ctx = rt.create_context(&[d]).unwrap();
            let _queue = rt.create_queue(&ctx, d).unwrap();
            let _buf = rt.create_buffer(&ctx, 8).unwrap();
            assert_eq!(rt.live_handles(), 3);
        }
        assert_eq!(rt.live_handles(), 0);
    }
}
