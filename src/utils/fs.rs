//! File system utilities.

use crate::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Create a directory (and parents) unless it already exists.
pub fn create_dir_all(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    tracing::info!("Created directory: {}", path.display());
    Ok(())
}

/// Check whether a file can be written, or created in its directory.
pub fn is_writable(path: &Path) -> bool {
    if path.exists() {
        return std::fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false);
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::metadata(dir)
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false)
}

/// Temporary sibling path used by [`write_atomic`].
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a file through a temporary sibling and rename it into place,
/// so a crash mid-write leaves the previous file intact.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
