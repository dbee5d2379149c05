//! Filesystem helpers shared by the file store and the wordbook loaders.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;

use crate::error::{Result, WordtrailError};

/// Maximum file size that can be read into memory (10 MB).
///
/// Activity logs are the only files expected to grow; a single user's log
/// stays far below this under normal use.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Read a file into a string with size limit protection.
///
/// # Errors
///
/// Returns an error if the file cannot be read or exceeds `MAX_FILE_SIZE`.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| WordtrailError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(WordtrailError::backend(format!(
            "File {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read_to_string(path).map_err(|e| WordtrailError::storage(path, e))
}

/// Read and parse a JSON document, `Ok(None)` if the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = read_to_string_limited(path)?;
    let value = serde_json::from_str(&content).map_err(|e| {
        WordtrailError::serde(format!("failed to parse {}: {}", path.display(), e))
    })?;
    Ok(Some(value))
}

/// A temp path next to `path` that no other writer will pick.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}-{}.tmp", name, std::process::id(), seq))
}

/// Write `contents` to a fresh temp file and flush it to disk.
fn write_temp(path: &Path, contents: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| WordtrailError::storage(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let mut file = fs::File::create(&temp_path).map_err(|e| WordtrailError::storage(&temp_path, e))?;
    file.write_all(contents)
        .map_err(|e| WordtrailError::storage(&temp_path, e))?;
    file.sync_all()
        .map_err(|e| WordtrailError::storage(&temp_path, e))?;
    Ok(temp_path)
}

/// Replace `path` atomically using temp file + rename.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = write_temp(path, contents)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        WordtrailError::storage(path, e)
    })
}

/// Publish `path` only if it does not exist yet.
///
/// The content is written to a temp file first and then hard-linked into
/// place. Linking fails with `AlreadyExists` when another writer got there
/// first, which is reported as [`WordtrailError::Conflict`]. Readers never
/// observe a partially written file.
pub fn create_exclusive(path: &Path, contents: &[u8], entity: &'static str, key: &str) -> Result<()> {
    let temp_path = write_temp(path, contents)?;
    let linked = fs::hard_link(&temp_path, path);
    let _ = fs::remove_file(&temp_path);

    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(WordtrailError::conflict(entity, key))
        }
        Err(e) => Err(WordtrailError::storage(path, e)),
    }
}

/// Regular `*.json` files in `dir`, skipping temp and hidden files.
///
/// A missing directory yields an empty list.
pub fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| WordtrailError::storage(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| WordtrailError::storage(dir, e))?;
        let path = entry.path();

        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        if path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true)
        {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}
