use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::collection::{Candidate, ContentHandle};

/// Expand `~` and `$VAR` in a user-supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Failed to expand path {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Describe a file on disk as a candidate without reading its bytes.
pub fn candidate_from_path<P: AsRef<Path>>(path: P) -> Result<Candidate> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", path.display()))?;

    Ok(Candidate {
        name,
        size_bytes: metadata.len(),
        content: ContentHandle::Path(path.to_path_buf()),
    })
}

/// Load every path, failing on the first unreadable one.
pub fn candidates_from_paths(paths: &[String]) -> Result<Vec<Candidate>> {
    paths
        .iter()
        .map(|raw| expand_path(raw).and_then(candidate_from_path))
        .collect()
}

/// Bytes behind a content handle, read only when needed (upload time).
pub fn read_content(handle: &ContentHandle) -> Result<Vec<u8>> {
    match handle {
        ContentHandle::Path(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read file {}", path.display())),
        ContentHandle::Inline(bytes) => Ok(bytes.to_vec()),
    }
}
