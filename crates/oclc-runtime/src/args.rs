//! Positional kernel-argument binding.

use std::fmt;

use crate::error::RuntimeError;
use crate::runtime::ComputeRuntime;

/// A by-value scalar kernel argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarArg {
    I32(i32),
    U32(u32),
    F32(f32),
}

impl ScalarArg {
    /// Size in bytes as seen by the kernel.
    pub fn size(&self) -> usize {
        match self {
            Self::I32(_) => std::mem::size_of::<i32>(),
            Self::U32(_) => std::mem::size_of::<u32>(),
            Self::F32(_) => std::mem::size_of::<f32>(),
        }
    }
}

/// One kernel argument descriptor.
pub enum KernelArg<'a, B> {
    /// A device buffer, passed as a memory object handle.
    Buffer(&'a B),
    Scalar(ScalarArg),
}

impl<B> KernelArg<'_, B> {
    /// Size in bytes handed to the runtime for this argument.
    pub fn size(&self) -> usize {
        match self {
            Self::Buffer(_) => std::mem::size_of::<usize>(),
            Self::Scalar(s) => s.size(),
        }
    }
}

impl<B> fmt::Debug for KernelArg<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(_) => f.write_str("Buffer"),
            Self::Scalar(s) => write!(f, "Scalar({s:?})"),
        }
    }
}

/// The runtime refused the argument at `index`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("kernel argument {index} rejected: {source}")]
pub struct ArgBindError {
    pub index: u32,
    #[source]
    pub source: RuntimeError,
}

/// Bind `args` to `kernel` left to right, argument `i` at index `i`.
///
/// Stops at the first refused argument; later arguments are not attempted.
pub fn set_kernel_args<R: ComputeRuntime>(
    runtime: &R,
    kernel: &R::Kernel,
    args: &[KernelArg<'_, R::Buffer>],
) -> Result<(), ArgBindError> {
    for (index, arg) in (0u32..).zip(args) {
        runtime
            .set_kernel_arg(kernel, index, arg)
            .map_err(|source| ArgBindError { index, source })?;
    }
    Ok(())
}
