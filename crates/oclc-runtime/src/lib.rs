//! Compute runtime seam for the oclc offline kernel compiler.
//!
//! Everything the compiler driver and the verifier need from an
//! OpenCL-compatible runtime goes through [`ComputeRuntime`]:
//! - **Discovery:** platforms, devices filtered by [`DeviceClass`], name/version queries
//! - **Compilation:** contexts, programs from source or binary, build, build log, binaries
//! - **Execution:** queues, buffers, kernels and positional argument binding
//!
//! Two implementations ship with the crate: [`sim::SimRuntime`], a deterministic
//! in-process runtime used by tests, and `ocl::OclRuntime` (feature `opencl`),
//! which drives the system ICD loader.

pub mod args;
pub mod device;
pub mod error;
#[cfg(feature = "opencl")]
pub mod ocl;
pub mod runtime;
pub mod sim;
pub mod status;

pub use args::{set_kernel_args, ArgBindError, KernelArg, ScalarArg};
pub use device::{DeviceClass, InfoParam, ParseDeviceClassError};
pub use error::{Result, RuntimeError};
pub use runtime::ComputeRuntime;
