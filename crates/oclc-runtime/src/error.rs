//! Error type for runtime calls.

use std::fmt;

use crate::status;

/// A non-success status returned by a runtime entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    /// Entry point that reported the status (e.g., `clBuildProgram`).
    pub call: &'static str,
    /// Raw status code.
    pub code: i32,
}

impl RuntimeError {
    pub fn new(call: &'static str, code: i32) -> Self {
        Self { call, code }
    }

    /// Symbolic status name, `UNKNOWN_STATUS` if the code is not in the table.
    pub fn name(&self) -> &'static str {
        status::describe(self.code)
    }

    /// Whether this error carries the given status code.
    pub fn is(&self, code: i32) -> bool {
        self.code == code
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[OpenCL] [{}] {} ({})", self.code, self.name(), self.call)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for runtime calls.
pub type Result<T> = std::result::Result<T, RuntimeError>;
