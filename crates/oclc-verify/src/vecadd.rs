//! The vector-addition check.

use oclc_build::{
    list_devices, list_platforms, select_devices, select_platform, CompilationContext,
    DEFAULT_MAX_DEVICES, DEFAULT_MAX_PLATFORMS,
};
use oclc_runtime::{
    set_kernel_args, ComputeRuntime, DeviceClass, InfoParam, KernelArg, ScalarArg,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::VerifyError;

/// Parameters of one verification run.
#[derive(Debug, Clone, PartialEq)]
pub struct VecAddCheck {
    /// Elements per input vector.
    pub len: usize,
    /// Largest accepted `|x + y - z|`.
    pub tolerance: f32,
    pub kernel_name: String,
    /// Fixed seed for the inputs; fresh entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for VecAddCheck {
    fn default() -> Self {
        Self {
            len: 65536,
            tolerance: 1.0e-5,
            kernel_name: "vecAdd".to_string(),
            seed: None,
        }
    }
}

/// A passed check.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    pub device: String,
    pub elements: usize,
    /// Largest observed `|x + y - z|`.
    pub max_error: f32,
}

impl VecAddCheck {
    /// Run the check on platform 0's first default device with random inputs.
    pub fn run<R: ComputeRuntime>(
        &self,
        runtime: &R,
        binary: &[u8],
    ) -> Result<VerifyReport, VerifyError> {
        let (x, y) = random_inputs(self.len, self.seed);
        self.run_with_inputs(runtime, binary, &x, &y)
    }

    /// Run the check with caller-provided inputs.
    pub fn run_with_inputs<R: ComputeRuntime>(
        &self,
        runtime: &R,
        binary: &[u8],
        x: &[f32],
        y: &[f32],
    ) -> Result<VerifyReport, VerifyError> {
        if x.len() != y.len() {
            return Err(VerifyError::InputMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        let n = i32::try_from(x.len()).map_err(|_| VerifyError::Length(x.len()))?;

        let platforms = list_platforms(runtime, DEFAULT_MAX_PLATFORMS)?;
        let platform = select_platform(&platforms, 0)?;
        let devices = list_devices(runtime, platform, DEFAULT_MAX_DEVICES, DeviceClass::Default)?;
        let devices = select_devices(&devices, 0, false)?;
        let device = devices[0];
        let device_name = runtime.device_info(device, InfoParam::Name)?;
        debug!(device = %device_name, elements = x.len(), "running vecAdd check");

        let ctx = CompilationContext::create(runtime, &devices)?;
        let queue = ctx.create_queue(device)?;
        let bytes = std::mem::size_of_val(x);
        let z_buf = runtime.create_buffer(ctx.handle(), bytes)?;
        let x_buf = runtime.create_buffer(ctx.handle(), bytes)?;
        let y_buf = runtime.create_buffer(ctx.handle(), bytes)?;
        runtime.write_buffer(&queue, &x_buf, bytemuck::cast_slice(x))?;
        runtime.write_buffer(&queue, &y_buf, bytemuck::cast_slice(y))?;

        let program = runtime.create_program_with_binary(ctx.handle(), device, binary)?;
        runtime.build_program(&program, &devices, "")?;
        let kernel = runtime.create_kernel(&program, &self.kernel_name)?;
        set_kernel_args(
            runtime,
            &kernel,
            &[
                KernelArg::Buffer(&z_buf),
                KernelArg::Buffer(&x_buf),
                KernelArg::Buffer(&y_buf),
                KernelArg::Scalar(ScalarArg::I32(n)),
            ],
        )?;
        runtime.enqueue_task(&queue, &kernel)?;
        runtime.finish(&queue)?;

        let mut z = vec![0f32; x.len()];
        runtime.read_buffer(&queue, &z_buf, bytemuck::cast_slice_mut(&mut z))?;

        let max_error = compare(x, y, &z, self.tolerance)?;
        Ok(VerifyReport {
            device: device_name,
            elements: x.len(),
            max_error,
        })
    }
}

/// Two input vectors of `len` random integers stored as `f32`.
pub fn random_inputs(len: usize, seed: Option<u64>) -> (Vec<f32>, Vec<f32>) {
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_rng(&mut rand::rng()),
    };
    let mut draw = || (0..len).map(|_| rng.random::<u32>() as f32).collect::<Vec<_>>();
    let x = draw();
    let y = draw();
    (x, y)
}

/// Check `z[i]` against `x[i] + y[i]`; returns the largest error seen.
pub fn compare(x: &[f32], y: &[f32], z: &[f32], tolerance: f32) -> Result<f32, VerifyError> {
    let mut max_error = 0f32;
    for (index, ((a, b), actual)) in x.iter().zip(y).zip(z).enumerate() {
        let expected = a + b;
        let error = (expected - actual).abs();
        if error.is_nan() || error > tolerance {
            return Err(VerifyError::Mismatch {
                index,
                expected,
                actual: *actual,
            });
        }
        max_error = max_error.max(error);
    }
    Ok(max_error)
}
