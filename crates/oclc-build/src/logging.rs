//! Log output for the oclc binaries.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,oclc=info,oclc_build=info,oclc_verify=info";

/// Install a stderr subscriber filtered by `RUST_LOG`, or by a default that
/// reports written binaries and nothing chattier.
///
/// Safe to call more than once; only the first call installs.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
