use oclc_build::BuildError;
use oclc_runtime::{ArgBindError, RuntimeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    ArgBind(#[from] ArgBindError),

    #[error("input length {0} does not fit the kernel's int parameter")]
    Length(usize),

    #[error("input lengths differ: x has {x} elements, y has {y}")]
    InputMismatch { x: usize, y: usize },

    #[error("Test FAILED: z[{index}] = {actual}, expected {expected}")]
    Mismatch {
        index: usize,
        expected: f32,
        actual: f32,
    },
}
