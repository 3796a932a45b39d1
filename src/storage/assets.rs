//! Filesystem primitives for local assets

use chrono::Local;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

/// Check that `path` is an existing regular file
pub async fn exists(path: &Path) -> bool {
    if let Ok(metadata) = tokio::fs::metadata(path).await {
        return metadata.is_file();
    }
    false
}

/// Create `path` recursively; an existing directory is not an error
pub async fn ensure_dir(path: &Path) -> AppResult<()> {
    match tokio::fs::create_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn copy_file(source: &Path, destination: &Path) -> AppResult<()> {
    tokio::fs::copy(source, destination).await?;
    log::info!("File copied from {} to {}", source.display(), destination.display());
    Ok(())
}

/// Move a file, falling back to copy + delete when `rename` fails
/// (source and destination on different filesystems).
pub async fn move_file(source: &Path, destination: &Path) -> AppResult<()> {
    if let Err(e) = tokio::fs::rename(source, destination).await {
        log::debug!("Rename of {} failed ({}), copying instead", source.display(), e);
        tokio::fs::copy(source, destination).await?;
        tokio::fs::remove_file(source).await?;
    }
    Ok(())
}

/// Delete a file, treating a missing file as already deleted.
/// Returns whether a file was actually removed.
pub async fn remove_if_exists(path: &Path) -> AppResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Final component of `path` as a string
pub fn file_name(path: &Path) -> AppResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| AppError::validation(format!("Path has no file name: {}", path.display())))
}

/// `YYYYMMDDHHmmssSSS` in local time plus the extension of `original`.
///
/// Two calls within the same millisecond yield the same name.
pub fn timestamp_file_name(original: &Path) -> String {
    let stamp = Local::now().format("%Y%m%d%H%M%S%3f").to_string();
    match original.extension() {
        Some(ext) => format!("{}.{}", stamp, ext.to_string_lossy()),
        None => stamp,
    }
}

/// Path of `path` relative to `root`, with `/` separators
pub fn relative_to(path: &Path, root: &Path) -> AppResult<String> {
    let relative: PathBuf = path
        .strip_prefix(root)
        .map_err(|_| {
            AppError::validation(format!(
                "{} is not under {}",
                path.display(),
                root.display()
            ))
        })?
        .to_path_buf();
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/"))
}
