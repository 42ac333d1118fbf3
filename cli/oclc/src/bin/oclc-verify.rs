//! oclc-verify: load an oclc binary and check `vecAdd` on the first device.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "oclc-verify",
    version,
    about = "Run a compiled vecAdd kernel binary and check its results"
)]
struct Cli {
    /// Program binary written by oclc
    binary: PathBuf,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };
    oclc_build::init_logging();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
    println!("Test PASSED");
}

fn run(cli: &Cli) -> Result<()> {
    let binary = std::fs::read(&cli.binary)
        .with_context(|| format!("reading {}", cli.binary.display()))?;
    execute(&binary)
}

#[cfg(feature = "opencl")]
fn execute(binary: &[u8]) -> Result<()> {
    let runtime = oclc_runtime::ocl::OclRuntime::new();
    let report = oclc_verify::VecAddCheck::default().run(&runtime, binary)?;
    tracing::info!(
        device = %report.device,
        elements = report.elements,
        max_error = report.max_error,
        "vecAdd check passed"
    );
    Ok(())
}

#[cfg(not(feature = "opencl"))]
fn execute(_binary: &[u8]) -> Result<()> {
    anyhow::bail!(
        "OpenCL support is not available.\n\
         Rebuild oclc-verify with OpenCL support:\n  \
         cargo build -p oclc --features opencl"
    )
}
