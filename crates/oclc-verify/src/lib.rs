//! Companion verifier for oclc-produced binaries.
//!
//! Loads one binary onto the first default device of platform 0, runs
//! `vecAdd(z, x, y, n)` over random inputs and checks `z[i] == x[i] + y[i]`
//! within an absolute tolerance.

pub mod error;
pub mod vecadd;

pub use error::VerifyError;
pub use vecadd::{compare, random_inputs, VecAddCheck, VerifyReport};
