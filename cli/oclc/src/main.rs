//! oclc: offline OpenCL kernel compiler.
//!
//! Compiles kernel sources on an installed OpenCL platform and writes each
//! device's program binary to disk for later loading with
//! `clCreateProgramWithBinary`.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use oclc_build::BuildError;
use oclc_runtime::{ComputeRuntime, DeviceClass};
use tracing::debug;

use commands::compile::CompileSettings;
use config::{CompileConfig, OclcConfig};

#[derive(Parser, Debug)]
#[command(name = "oclc", version, about = "Offline OpenCL kernel compiler")]
struct Cli {
    /// Compile the kernel program for every detected device
    #[arg(short, long)]
    all: bool,
    /// List all platforms and devices, then exit
    #[arg(short, long)]
    list: bool,
    /// Device type: all, default, cpu or gpu [default: default]
    #[arg(short = 't', long, value_name = "TYPE")]
    device_type: Option<DeviceClass>,
    /// Output file name
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Compile options passed verbatim to the OpenCL compiler
    #[arg(
        short = 'O',
        long = "option",
        value_name = "COMPILE_OPTION",
        allow_hyphen_values = true
    )]
    option: Option<String>,
    /// Platform index [default: 0]
    #[arg(short, long, value_name = "INDEX")]
    platform: Option<usize>,
    /// Device index [default: 0]
    #[arg(short, long, value_name = "INDEX")]
    device: Option<usize>,
    /// Check syntax only; do not write binaries
    #[arg(long = "fsyntax-only")]
    syntax_only: bool,
    /// Print the listing or build summary as JSON
    #[arg(long)]
    json: bool,
    /// Kernel source files, concatenated in order
    #[arg(value_name = "SOURCE")]
    sources: Vec<PathBuf>,
}

impl Cli {
    /// Flags win over `oclc.toml`, which wins over built-in defaults.
    fn settings(&self, file: &CompileConfig) -> CompileSettings {
        CompileSettings {
            sources: self.sources.clone(),
            device_class: self.device_type.or(file.device_type).unwrap_or_default(),
            platform: self.platform.or(file.platform).unwrap_or(0),
            device: self.device.or(file.device).unwrap_or(0),
            all: self.all || file.all.unwrap_or(false),
            options: self
                .option
                .clone()
                .or_else(|| file.options.clone())
                .unwrap_or_default(),
            output: self.output.clone(),
            syntax_only: self.syntax_only,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not failures.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };
    oclc_build::init_logging();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = match OclcConfig::find_and_load(&cwd)? {
        Some((config, dir)) => {
            debug!(dir = %dir.display(), "using oclc.toml");
            config
        }
        None => OclcConfig::default(),
    };
    let settings = cli.settings(&config.compile);
    if !cli.list && settings.sources.is_empty() {
        return Err(BuildError::NoSources.into());
    }
    execute(&cli, &settings)
}

#[cfg(feature = "opencl")]
fn execute(cli: &Cli, settings: &CompileSettings) -> Result<()> {
    let runtime = oclc_runtime::ocl::OclRuntime::new();
    dispatch(&runtime, cli, settings)
}

#[cfg(not(feature = "opencl"))]
fn execute(_cli: &Cli, _settings: &CompileSettings) -> Result<()> {
    anyhow::bail!(
        "OpenCL support is not available.\n\
         Rebuild oclc with OpenCL support:\n  \
         cargo build -p oclc --features opencl"
    )
}

#[cfg_attr(not(feature = "opencl"), allow(dead_code))]
fn dispatch<R: ComputeRuntime>(runtime: &R, cli: &Cli, settings: &CompileSettings) -> Result<()> {
    if cli.list {
        return commands::list::run(runtime, settings.device_class, cli.json);
    }
    let summary = commands::compile::run(runtime, settings)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
