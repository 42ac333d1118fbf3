//! Compile-and-extract pipeline for the oclc offline kernel compiler.
//!
//! Drives an OpenCL-compatible runtime from kernel sources to per-device
//! binaries on disk:
//! discovery -> context -> program build -> binary extraction -> output files.
//!
//! Every stage is a blocking call on the runtime, and every native resource is
//! owned by the stack frame that created it, so early returns release in
//! reverse order of acquisition.

pub mod context;
pub mod digest;
pub mod directory;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod reporter;
pub mod source;
pub mod summary;

pub use context::CompilationContext;
pub use digest::{artifact_digest, digest_hex, ArtifactDigest};
pub use directory::{
    list_devices, list_platforms, select_devices, select_platform, DEFAULT_MAX_DEVICES,
    DEFAULT_MAX_PLATFORMS,
};
pub use error::BuildError;
pub use logging::init_logging;
pub use output::{write_artifacts, OutputNaming, WriteOutcome};
pub use pipeline::{
    compile, BinaryArtifact, BuildOutcome, BuildRequest, BuildStage, BUILD_LOG_LIMIT,
};
pub use reporter::{CapabilityReport, DeviceEntry, PlatformEntry, MAX_REPORTED_DEVICES};
pub use source::{output_stem, read_sources};
pub use summary::BuildSummary;
