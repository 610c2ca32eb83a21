use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::ico::{self, IcoError};
use crate::prepare;

#[derive(Debug)]
pub enum Outcome {
    Written { path: PathBuf, bytes: u64 },
    /// Input path does not exist; nothing was written.
    MissingInput(PathBuf),
}

pub fn run(input: &Path, output: &Path, config: &Config) -> Result<Outcome> {
    let input = std::path::absolute(input)
        .with_context(|| format!("Failed to resolve input path {}", input.display()))?;
    let output = std::path::absolute(output)
        .with_context(|| format!("Failed to resolve output path {}", output.display()))?;

    if !input.exists() {
        return Ok(Outcome::MissingInput(input));
    }

    if config.create_parent_dirs {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory {}", parent.display())
            })?;
        }
    }

    let bytes = fs::read(&input)
        .with_context(|| format!("Failed to read input image {}", input.display()))?;
    tracing::info!("Converting {} ({} bytes)", input.display(), bytes.len());

    let payload = prepare::prepare_png_payload(&bytes, config.resize_filter)
        .with_context(|| format!("Failed to prepare {}", input.display()))?;

    // only a regular file (or nothing) at the output path may be cleaned up later
    let owns_output = fs::symlink_metadata(&output)
        .map(|m| m.file_type().is_file())
        .unwrap_or(true);

    match ico::write_icon_file(&output, &payload) {
        Ok(bytes) => Ok(Outcome::Written {
            path: output,
            bytes,
        }),
        Err(e) => {
            // a Create error means the file was never opened, so leave whatever is there
            if config.remove_partial_output && owns_output && !matches!(e, IcoError::Create(_)) {
                discard_partial(&output);
            }
            Err(anyhow::Error::new(e).context(format!("Failed to write {}", output.display())))
        }
    }
}

/// Removes `path` if it is a regular file. Symlinks, devices and pipes are left alone.
fn discard_partial(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_file() => {}
        Ok(_) => {
            tracing::warn!("Not removing {}: not a regular file", path.display());
            return false;
        }
        Err(_) => return false,
    }
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!("Removed partial output {}", path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
            false
        }
    }
}
