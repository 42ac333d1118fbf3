//! The build pipeline: program creation, build, outcome classification and
//! per-device binary extraction.
//!
//! ```text
//! SourceLoaded -> ProgramCreated -> Building -+-> Succeeded -> (extract)
//!                                             +-> Failed            (log of first device)
//!                                             +-> RejectedOptions   (no log)
//! ```
//!
//! Every failure is terminal. The program handle is dropped before this
//! module returns, on success and on every error path.

use std::fmt;

use oclc_runtime::{status, ComputeRuntime, RuntimeError};
use tracing::{debug, warn};

use crate::context::CompilationContext;
use crate::error::BuildError;

/// Upper bound on the build log carried by [`BuildError::BuildFailure`].
pub const BUILD_LOG_LIMIT: usize = 2048;

/// Pipeline state, reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    SourceLoaded,
    ProgramCreated,
    Building,
    Succeeded,
    Failed,
    RejectedOptions,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourceLoaded => "source-loaded",
            Self::ProgramCreated => "program-created",
            Self::Building => "building",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::RejectedOptions => "rejected-options",
        };
        f.write_str(name)
    }
}

/// The compiled binary for one bound device.
///
/// `bytes` is `None` when the runtime reported a size of zero, meaning the
/// device took no part in the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArtifact {
    pub device_index: usize,
    pub bytes: Option<Vec<u8>>,
}

/// What a successful [`compile`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Syntax-only run: the build succeeded and nothing was extracted.
    Checked,
    /// One artifact per device bound to the program, in bound order.
    Extracted(Vec<BinaryArtifact>),
}

impl BuildOutcome {
    pub fn artifacts(&self) -> &[BinaryArtifact] {
        match self {
            Self::Checked => &[],
            Self::Extracted(artifacts) => artifacts,
        }
    }
}

/// Inputs of one compile.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Source file contents; order is significant.
    pub sources: Vec<Vec<u8>>,
    /// Passed to the compiler verbatim.
    pub options: String,
    /// Stop after a successful build.
    pub syntax_only: bool,
}

impl BuildRequest {
    pub fn new<S: Into<Vec<u8>>>(sources: impl IntoIterator<Item = S>) -> Self {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    pub fn syntax_only(mut self, syntax_only: bool) -> Self {
        self.syntax_only = syntax_only;
        self
    }
}

/// Build `request.sources` for exactly `devices` within `ctx`.
///
/// `devices` must be a subset of the context's devices. Artifacts are
/// returned for every device bound to the context, so a device left out of
/// `devices` shows up as an absent artifact at its position.
pub fn compile<R: ComputeRuntime>(
    ctx: &CompilationContext<'_, R>,
    devices: &[R::Device],
    request: &BuildRequest,
) -> Result<BuildOutcome, BuildError> {
    let rt = ctx.runtime();
    if request.sources.is_empty() {
        return Err(BuildError::NoSources);
    }
    debug!(stage = %BuildStage::SourceLoaded, sources = request.sources.len());

    let program = rt
        .create_program_with_source(ctx.handle(), &request.sources)
        .map_err(BuildError::ProgramCreation)?;
    debug!(stage = %BuildStage::ProgramCreated);

    debug!(
        stage = %BuildStage::Building,
        devices = devices.len(),
        options = %request.options,
    );
    if let Err(err) = rt.build_program(&program, devices, &request.options) {
        return Err(classify(rt, &program, devices, &request.options, err));
    }
    debug!(stage = %BuildStage::Succeeded);

    if request.syntax_only {
        return Ok(BuildOutcome::Checked);
    }
    extract(rt, &program).map(BuildOutcome::Extracted)
}

fn classify<R: ComputeRuntime>(
    rt: &R,
    program: &R::Program,
    devices: &[R::Device],
    options: &str,
    err: RuntimeError,
) -> BuildError {
    match err.code {
        status::BUILD_PROGRAM_FAILURE => {
            debug!(stage = %BuildStage::Failed);
            // Only the first device's log is fetched, whichever device failed.
            let log = match devices.first() {
                Some(&device) => match rt.build_log(program, device) {
                    Ok(log) => truncate_log(log, BUILD_LOG_LIMIT),
                    Err(log_err) => {
                        warn!(error = %log_err, "build log unavailable");
                        String::new()
                    }
                },
                None => String::new(),
            };
            BuildError::BuildFailure { status: err, log }
        }
        status::INVALID_BUILD_OPTIONS => {
            debug!(stage = %BuildStage::RejectedOptions);
            BuildError::InvalidOptions {
                status: err,
                options: options.to_string(),
            }
        }
        _ => BuildError::Runtime(err),
    }
}

fn extract<R: ComputeRuntime>(
    rt: &R,
    program: &R::Program,
) -> Result<Vec<BinaryArtifact>, BuildError> {
    let bound = rt
        .program_num_devices(program)
        .map_err(BuildError::Runtime)?;
    let sizes = rt
        .program_binary_sizes(program)
        .map_err(BuildError::Runtime)?;
    if sizes.len() != bound {
        return Err(BuildError::ArtifactMismatch {
            devices: bound,
            sizes: sizes.len(),
        });
    }

    let mut buffers: Vec<Option<Vec<u8>>> = sizes
        .iter()
        .map(|&size| (size > 0).then(|| vec![0u8; size]))
        .collect();
    rt.program_binaries(program, &mut buffers)
        .map_err(BuildError::Runtime)?;
    debug!(bound, extracted = buffers.iter().flatten().count(), "binaries extracted");

    Ok(buffers
        .into_iter()
        .enumerate()
        .map(|(device_index, bytes)| BinaryArtifact {
            device_index,
            bytes,
        })
        .collect())
}

/// Cut `log` to at most `limit` bytes on a char boundary and drop trailing
/// whitespace.
fn truncate_log(mut log: String, limit: usize) -> String {
    if log.len() > limit {
        let mut end = limit;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log.truncate(log.trim_end().len());
    log
}
