use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{BubblecastError, BubblecastResult};

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> BubblecastResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> BubblecastResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Delete `path` if present. Returns `true` when a file was removed.
pub fn remove_stale(path: &Path) -> BubblecastResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to remove stale file '{}'", path.display()))
            .into()),
    }
}

/// Fail with a resource error unless `path` is an existing regular file.
pub fn require_file(path: &Path, what: &str) -> BubblecastResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BubblecastError::resource(format!(
            "{what} '{}' does not exist",
            path.display()
        )))
    }
}

/// Delete `<n>.<ext>` files in `dir` numbered above `keep`, left by a longer earlier run.
///
/// Returns how many files were removed. A missing `dir` removes nothing.
pub fn prune_numbered_above(dir: &Path, ext: &str, keep: usize) -> BubblecastResult<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to list '{}'", dir.display()))
                .into());
        }
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list '{}'", dir.display()))?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let Some(n) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<usize>().ok())
        else {
            continue;
        };
        if n > keep && remove_stale(&path)? {
            removed += 1;
        }
    }
    Ok(removed)
}
