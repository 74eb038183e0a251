//! Archive extraction for downloaded arXiv source bundles.
//!
//! arXiv serves either gzipped tarballs, zip files, or a bare `.tex` file;
//! callers detect the container and extraction here preserves the archive's
//! relative layout while refusing path-traversal and junk entries.

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

/// Returns the sanitized relative output path for an archive member, or
/// `None` when the entry must be skipped (directories are handled by the
/// callers, traversal and junk entries are dropped here).
fn sanitized_path(name: &Path) -> Option<PathBuf> {
    let name_str = name.to_string_lossy();
    if name_str.contains("__MACOSX") {
        return None;
    }
    // Reject absolute paths and any `..` component.
    if name
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    // Hidden files (dotfiles) are resource-fork noise, not source.
    if name
        .file_name()
        .is_none_or(|f| f.to_string_lossy().starts_with('.'))
    {
        return None;
    }
    Some(name.to_path_buf())
}

/// Extract a gzipped tarball into `dir`, preserving relative paths.
/// Returns the number of files written.
pub(crate) fn extract_tar_gz(data: &[u8], dir: &Path) -> Result<usize, String> {
    let gz = GzDecoder::new(data);
    let mut archive = Archive::new(gz);

    let entries = archive
        .entries()
        .map_err(|e| format!("failed to read tar.gz: {}", e))?;

    let mut written = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| format!("failed to read tar entry: {}", e))?;
        if entry.header().entry_type().is_dir() {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| format!("failed to read entry path: {}", e))?
            .to_path_buf();
        let Some(relative) = sanitized_path(&path) else {
            continue;
        };

        let out_path = dir.join(relative);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| format!("failed to extract {}: {}", path.display(), e))?;
        std::fs::write(&out_path, &buf)
            .map_err(|e| format!("failed to write {}: {}", out_path.display(), e))?;
        written += 1;
    }

    Ok(written)
}

/// Extract a zip archive into `dir`, preserving relative paths.
/// Returns the number of files written.
pub(crate) fn extract_zip(data: &[u8], dir: &Path) -> Result<usize, String> {
    let cursor = std::io::Cursor::new(data);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| format!("failed to open zip: {}", e))?;

    let mut written = 0usize;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| format!("failed to read zip entry: {}", e))?;
        if file.is_dir() {
            continue;
        }

        // enclosed_name already rejects traversal; sanitize the rest.
        let Some(name) = file.enclosed_name() else {
            continue;
        };
        let Some(relative) = sanitized_path(&name) else {
            continue;
        };

        let out_path = dir.join(relative);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| format!("failed to extract zip entry: {}", e))?;
        std::fs::write(&out_path, &buf)
            .map_err(|e| format!("failed to write {}: {}", out_path.display(), e))?;
        written += 1;
    }

    Ok(written)
}
