//! Kernel source loading.

use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Read every source file's bytes, in the order given.
///
/// Contents are not decoded here; the runtime accepts or refuses them.
pub fn read_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Vec<u8>>, BuildError> {
    if paths.is_empty() {
        return Err(BuildError::NoSources);
    }
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            std::fs::read(path).map_err(|error| BuildError::Io {
                path: path.to_path_buf(),
                error,
            })
        })
        .collect()
}

/// `path` without its final extension: `dir/vecadd.cl` becomes `dir/vecadd`.
pub fn output_stem(path: &Path) -> PathBuf {
    path.with_extension("")
}
