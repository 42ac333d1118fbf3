//! `oclc <SOURCES>...`: compile kernel sources to per-device binaries.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use oclc_build::{
    compile, list_devices, list_platforms, output_stem, read_sources, select_devices,
    select_platform, write_artifacts, BuildError, BuildOutcome, BuildRequest, BuildSummary,
    CompilationContext, OutputNaming, DEFAULT_MAX_DEVICES, DEFAULT_MAX_PLATFORMS,
};
use oclc_runtime::{ComputeRuntime, DeviceClass, InfoParam};
use tracing::debug;

/// Fully resolved compile settings: flags over `oclc.toml` over defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSettings {
    pub sources: Vec<PathBuf>,
    pub device_class: DeviceClass,
    pub platform: usize,
    pub device: usize,
    pub all: bool,
    pub options: String,
    pub output: Option<PathBuf>,
    pub syntax_only: bool,
}

/// Compile `settings.sources` and write one binary per bound device next to
/// the first source (or to `settings.output`).
///
/// Fails if any stage before writing fails, or if every attempted write
/// failed.
pub fn run<R: ComputeRuntime>(runtime: &R, settings: &CompileSettings) -> Result<BuildSummary> {
    let started = Instant::now();
    let Some(first_source) = settings.sources.first() else {
        return Err(BuildError::NoSources.into());
    };
    let sources = read_sources(&settings.sources)?;

    let platforms = list_platforms(runtime, DEFAULT_MAX_PLATFORMS)?;
    let platform = select_platform(&platforms, settings.platform)?;
    let devices = list_devices(runtime, platform, DEFAULT_MAX_DEVICES, settings.device_class)?;
    let selected = select_devices(&devices, settings.device, settings.all)?;
    let device_names = selected
        .iter()
        .map(|&d| runtime.device_info(d, InfoParam::Name))
        .collect::<Result<Vec<_>, _>>()
        .map_err(BuildError::Discovery)?;
    debug!(platform = settings.platform, devices = ?device_names, "devices selected");

    let ctx = CompilationContext::create(runtime, &selected)?;
    let request = BuildRequest::new(sources)
        .with_options(settings.options.as_str())
        .syntax_only(settings.syntax_only);
    let outcome = compile(&ctx, &selected, &request)?;
    drop(ctx);

    let mut summary = BuildSummary {
        platform: settings.platform,
        devices: device_names,
        sources: settings.sources.clone(),
        syntax_only: settings.syntax_only,
        ..BuildSummary::default()
    };
    if let BuildOutcome::Extracted(artifacts) = &outcome {
        let naming = OutputNaming::new(output_stem(first_source), settings.output.clone());
        summary.record(&write_artifacts(artifacts, &naming));
    }
    summary.duration_ms = started.elapsed().as_millis() as u64;

    if summary.all_writes_failed() {
        let first = &summary.failed[0];
        bail!(
            "no binary could be written: {}: {}",
            first.path.display(),
            first.error
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use oclc_runtime::sim::{SimDevice, SimPlatform, SimRuntime};
    use oclc_runtime::status;

    const VALID: &str = "__kernel void noop(__global int* a) { a[0] = 1; }\n";

    fn source(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn settings(sources: Vec<PathBuf>) -> CompileSettings {
        CompileSettings {
            sources,
            ..CompileSettings::default()
        }
    }

    fn files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn single_device_writes_stem_bin() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "vecadd.cl", VALID);
        let rt = SimRuntime::single_gpu();
        let summary = run(&rt, &settings(vec![src])).unwrap();
        assert_eq!(files(dir.path()), vec!["vecadd.bin", "vecadd.cl"]);
        assert_eq!(summary.devices, vec!["Sim GPU 0"]);
        assert_eq!(summary.written.len(), 1);
        assert_eq!(rt.live_handles(), 0);
    }

    #[test]
    fn all_devices_get_indexed_files() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::workstation();
        let settings = CompileSettings {
            all: true,
            device_class: DeviceClass::All,
            ..settings(vec![src])
        };
        run(&rt, &settings).unwrap();
        assert_eq!(
            files(dir.path()),
            vec!["k.bin.0", "k.bin.1", "k.bin.2", "k.cl"]
        );
    }

    #[test]
    fn device_index_selects_one_device() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::workstation();
        let settings = CompileSettings {
            device_class: DeviceClass::All,
            device: 2,
            ..settings(vec![src])
        };
        let summary = run(&rt, &settings).unwrap();
        assert_eq!(summary.devices, vec!["Sim CPU"]);
        assert_eq!(files(dir.path()), vec!["k.bin", "k.cl"]);
    }

    #[test]
    fn output_override() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::single_gpu();
        let settings = CompileSettings {
            output: Some(dir.path().join("custom.out")),
            ..settings(vec![src])
        };
        run(&rt, &settings).unwrap();
        assert!(dir.path().join("custom.out").is_file());
        assert!(!dir.path().join("k.bin").exists());
    }

    #[test]
    fn excluded_device_is_skipped_without_shifting_names() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::new(vec![SimPlatform::new("p", "OpenCL 1.2")
            .with_device(SimDevice::gpu("a"))
            .with_device(SimDevice::gpu("b").without_link())
            .with_device(SimDevice::gpu("c"))]);
        let settings = CompileSettings {
            all: true,
            device_class: DeviceClass::All,
            ..settings(vec![src])
        };
        let summary = run(&rt, &settings).unwrap();
        assert_eq!(summary.skipped, vec![1]);
        assert_eq!(files(dir.path()), vec!["k.bin.0", "k.bin.2", "k.cl"]);
    }

    #[test]
    fn syntax_only_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::single_gpu();
        let settings = CompileSettings {
            syntax_only: true,
            ..settings(vec![src])
        };
        let summary = run(&rt, &settings).unwrap();
        assert!(summary.written.is_empty());
        assert_eq!(files(dir.path()), vec!["k.cl"]);
    }

    #[test]
    fn build_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "bad.cl", "__kernel void f() {\n#error missing brace\n");
        let rt = SimRuntime::workstation();
        let settings = CompileSettings {
            all: true,
            ..settings(vec![src])
        };
        let err = run(&rt, &settings).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("CL_BUILD_PROGRAM_FAILURE"));
        assert!(text.contains("error: missing brace"));
        assert_eq!(files(dir.path()), vec!["bad.cl"]);
        assert_eq!(rt.live_handles(), 0);
    }

    #[test]
    fn sources_are_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = source(dir.path(), "a.cl", "__kernel void f() {\n");
        let b = source(dir.path(), "b.cl", "}\n");
        let rt = SimRuntime::single_gpu();
        run(&rt, &settings(vec![a, b])).unwrap();
        assert!(dir.path().join("a.bin").is_file());
    }

    #[test]
    fn unreadable_source_fails_before_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let rt = SimRuntime::single_gpu();
        rt.fail_call("clGetPlatformIDs", status::OUT_OF_HOST_MEMORY);
        let missing = dir.path().join("missing.cl");
        let err = run(&rt, &settings(vec![missing])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Io { .. })
        ));
    }

    #[test]
    fn readable_non_utf8_source_reaches_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.cl");
        std::fs::write(&path, b"// Autor: M\xfcller\n__kernel void k(__global int* a) { a[0] = 1; }\n")
            .unwrap();
        let rt = SimRuntime::single_gpu();
        let err = run(&rt, &settings(vec![path])).unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::ProgramCreation(refused)) => {
                assert_eq!(refused.call, "clCreateProgramWithSource")
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(files(dir.path()), vec!["k.cl"]);
        assert_eq!(rt.live_handles(), 0);
    }

    #[test]
    fn out_of_range_indices() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::single_gpu();

        let err = run(&rt, &CompileSettings { platform: 4, ..settings(vec![src.clone()]) }).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::PlatformIndex { index: 4, available: 1 })
        ));
        let err = run(&rt, &CompileSettings { device: 1, ..settings(vec![src]) }).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::DeviceIndex { index: 1, available: 1 })
        ));
    }

    #[test]
    fn no_sources() {
        let rt = SimRuntime::single_gpu();
        let err = run(&rt, &CompileSettings::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::NoSources)
        ));
    }

    #[test]
    fn rejected_options() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::single_gpu();
        let settings = CompileSettings {
            options: "-O3x".into(),
            ..settings(vec![src])
        };
        let err = run(&rt, &settings).unwrap_err();
        assert!(format!("{err:#}").contains("CL_INVALID_BUILD_OPTIONS"));
    }

    #[test]
    fn every_write_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::single_gpu();
        let settings = CompileSettings {
            output: Some(dir.path().join("no/such/dir/out.bin")),
            ..settings(vec![src])
        };
        let err = run(&rt, &settings).unwrap_err();
        assert!(err.to_string().starts_with("no binary could be written"));
    }

    #[test]
    fn repeated_builds_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(dir.path(), "k.cl", VALID);
        let rt = SimRuntime::workstation();
        let settings = CompileSettings {
            all: true,
            ..settings(vec![src])
        };
        let first = run(&rt, &settings).unwrap();
        let second = run(&rt, &settings).unwrap();
        let digests = |s: &BuildSummary| s.written.iter().map(|w| w.sha256.clone()).collect::<Vec<_>>();
        assert_eq!(digests(&first), digests(&second));
    }
}
