use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WriteError;

/// Creates a fresh versioned output directory under `base` and returns it.
///
/// Tagged layouts are named `{tag}_{name}_v{version}` (tag "g" marks datasets
/// annotated with ground, "ng" without); untagged layouts `{version}_{name}`.
/// The version counts up from 1 until an unused name is found, so earlier
/// runs are never overwritten.
pub fn versioned_dir(base: &Path, name: &str, tag: Option<&str>) -> Result<PathBuf, WriteError> {
    let mut version = 1;
    loop {
        let dir_name = match tag {
            Some(tag) => format!("{}_{}_v{}", tag, name, version),
            None => format!("{}_{}", version, name),
        };
        let path = base.join(dir_name);
        if !path.is_dir() {
            fs::create_dir_all(&path).map_err(|source| WriteError::CreateDirectory {
                path: path.display().to_string(),
                source,
            })?;
            return Ok(path);
        }
        log::debug!("directory {} exists", path.display());
        version += 1;
    }
}
