//! Atomic file writes
//!
//! Content is written to a `.tmp-` file in the destination directory, synced,
//! and renamed over the destination. Readers see the old file or the new one,
//! never a partial write.

use crate::error::{SwitchError, SwitchResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Prefix of temporary files created next to their destination
pub const TEMP_PREFIX: &str = ".tmp-";

/// Mode given to files that did not exist before the write
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Replace `path` with `content`, or leave it unchanged on failure
///
/// An existing file keeps its permissions.
///
/// # Errors
/// Returns an error if the temp file cannot be written or renamed into place;
/// the temp file is removed in that case
pub fn write_atomic(path: &Path, content: &[u8]) -> SwitchResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| SwitchError::file(dir, e))?;

    let existing = fs::metadata(path)
        .ok()
        .filter(fs::Metadata::is_file)
        .map(|meta| meta.permissions());

    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_PREFIX);
    if existing.is_none() {
        new_file_permissions(&mut builder);
    }
    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|e| SwitchError::file(dir, e))?;

    temp.write_all(content)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| SwitchError::file(temp.path(), e))?;

    if let Some(permissions) = existing {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| SwitchError::file(temp.path(), e))?;
    }

    // A failed persist hands the temp file back; dropping it deletes it.
    temp.persist(path)
        .map_err(|e| SwitchError::file(path, e.error))?;

    Ok(())
}

#[cfg(unix)]
fn new_file_permissions(builder: &mut tempfile::Builder<'_, '_>) {
    use std::os::unix::fs::PermissionsExt;
    builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
}

#[cfg(not(unix))]
fn new_file_permissions(_builder: &mut tempfile::Builder<'_, '_>) {}

/// Serialize `value` as pretty JSON and write it atomically
///
/// # Errors
/// Returns an error if serialization or the write fails
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> SwitchResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    write_atomic(path, content.as_bytes())
}

/// Read and decode a JSON file
///
/// # Errors
/// Returns an error if the file cannot be read or does not decode
pub fn read_json<T: DeserializeOwned>(path: &Path) -> SwitchResult<T> {
    let content = fs::read_to_string(path).map_err(|e| SwitchError::file(path, e))?;
    serde_json::from_str(&content).map_err(|e| SwitchError::parse(path, e))
}

/// Read and decode a JSON file, using the default value if it does not exist
///
/// # Errors
/// Returns an error if the file exists but cannot be read or decoded
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> SwitchResult<T> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map_err(|e| SwitchError::parse(path, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(SwitchError::file(path, e)),
    }
}

/// Read a file's bytes, or `None` if it does not exist
///
/// # Errors
/// Returns an error for any failure other than the file being absent
pub fn read_optional(path: &Path) -> SwitchResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SwitchError::file(path, e)),
    }
}

/// Remove a file, returning whether it existed
///
/// # Errors
/// Returns an error for any failure other than the file being absent
pub fn remove_file_if_exists(path: &Path) -> SwitchResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SwitchError::file(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with(TEMP_PREFIX))
            .collect()
    }

    #[test]
    fn test_write_atomic_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/settings.json");

        write_atomic(&path, b"hello").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(temp_files(path.parent().unwrap()).is_empty());
    }

    #[test]
    fn test_write_atomic_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");

        write_atomic(&path, b"same content").unwrap();
        write_atomic(&path, b"same content").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"same content");
        assert!(temp_files(temp.path()).is_empty());
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, "old content that is longer than the new one").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&path, b"{\"a\": 1}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\": 1}");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_new_file_matches_plain_create() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let plain = temp.path().join("plain.json");
        fs::write(&plain, "{}").unwrap();
        let path = temp.path().join("profile.json");

        write_atomic(&path, b"{}").unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&plain));
    }

    #[test]
    fn test_failed_write_leaves_target_and_no_temp() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be replaced by a file rename
        let path = temp.path().join("occupied");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner.txt"), "keep").unwrap();

        let result = write_atomic(&path, b"content");

        assert!(result.is_err());
        assert!(path.is_dir());
        assert_eq!(fs::read_to_string(path.join("inner.txt")).unwrap(), "keep");
        assert!(temp_files(temp.path()).is_empty());
    }

    #[test]
    fn test_json_round_trip_is_pretty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");

        write_json_atomic(&path, &json!({"b": 1, "a": [true]})).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"b\": 1"));
        let value: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(value["a"][0], true);
    }

    #[test]
    fn test_read_json_or_default_missing() {
        let temp = TempDir::new().unwrap();
        let value: serde_json::Map<String, serde_json::Value> =
            read_json_or_default(&temp.path().join("missing.json")).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_read_json_reports_path_on_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_json::<serde_json::Value>(&path).unwrap_err();

        assert_eq!(err.code(), "PARSE_ERROR");
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_remove_file_if_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CLAUDE.md");
        fs::write(&path, "doc").unwrap();

        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!remove_file_if_exists(&path).unwrap());
    }
}
