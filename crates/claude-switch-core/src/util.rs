//! Name validation and path helpers

use crate::error::{SwitchError, SwitchResult};
use chrono::{SecondsFormat, Utc};
use std::path::{Component, Path, PathBuf};

/// Longest accepted profile name
pub const MAX_PROFILE_NAME_LEN: usize = 50;

/// Descriptions are truncated to this many characters
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Validate a profile name
///
/// Names are 1 to 50 characters of ASCII letters, digits, `-` and `_`.
///
/// # Errors
/// Returns a validation error if the name is empty, too long, or contains
/// any other character
pub fn validate_profile_name(name: &str) -> SwitchResult<()> {
    if name.is_empty() {
        return Err(SwitchError::Validation(
            "Profile name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_PROFILE_NAME_LEN {
        return Err(SwitchError::Validation(format!(
            "Profile name too long (max {MAX_PROFILE_NAME_LEN} characters)"
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SwitchError::Validation(
            "Profile name can only contain letters, numbers, hyphens, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate an item name (command, skill, agent, hook, server) for use in paths
/// Names must not contain path separators or .. sequences
///
/// # Errors
/// Returns an error if the name is invalid
pub fn validate_item_name(name: &str) -> SwitchResult<()> {
    if name.is_empty() {
        return Err(SwitchError::Validation("Item name cannot be empty".to_string()));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(SwitchError::Validation(format!(
            "Item name contains path separator: {name}"
        )));
    }

    if name.contains("..") {
        return Err(SwitchError::Validation(format!(
            "Item name contains parent directory reference: {name}"
        )));
    }

    if name.starts_with('.') {
        return Err(SwitchError::Validation(format!(
            "Item name cannot start with dot: {name}"
        )));
    }

    if name.contains('\0') {
        return Err(SwitchError::Validation(
            "Item name contains null byte".to_string(),
        ));
    }

    Ok(())
}

/// Trim a description and cap it at [`MAX_DESCRIPTION_LEN`] characters
#[must_use]
pub fn cap_description(description: &str) -> String {
    description.trim().chars().take(MAX_DESCRIPTION_LEN).collect()
}

/// Current time as an RFC 3339 string with millisecond precision
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time formatted for use in file names (`2024-05-01T10-20-30-123Z`)
#[must_use]
pub fn file_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// Compute the path of `target` relative to the directory `from_dir`
///
/// Both paths are compared lexically, so they must share a base (both
/// absolute, or both relative to the same directory).
#[must_use]
pub fn relative_path(from_dir: &Path, target: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component<'_>> = target
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_profile_name_normal() {
        assert!(validate_profile_name("work").is_ok());
        assert!(validate_profile_name("valid-name_123").is_ok());
        assert!(validate_profile_name(&"a".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_profile_name_rejects_bad_characters() {
        for name in ["bad name", "bad/name", "bad..name", "bad@name", "../escape", "bad name!"] {
            assert!(validate_profile_name(name).is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn test_validate_profile_name_length() {
        assert!(validate_profile_name("").is_err());
        let err = validate_profile_name(&"a".repeat(60)).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("my-skill").is_ok());
        assert!(validate_item_name("PreToolUse").is_ok());
        assert!(validate_item_name("../etc").is_err());
        assert!(validate_item_name("foo/bar").is_err());
        assert!(validate_item_name("foo\\bar").is_err());
        assert!(validate_item_name(".hidden").is_err());
    }

    #[test]
    fn test_cap_description() {
        assert_eq!(cap_description("  My great profile (v2.0) "), "My great profile (v2.0)");
        assert_eq!(cap_description(&"x".repeat(500)).chars().count(), 200);
        assert_eq!(cap_description(&"é".repeat(201)).chars().count(), 200);
    }

    #[test]
    fn test_relative_path_sibling_tree() {
        let rel = relative_path(
            Path::new("/home/u/.claude"),
            Path::new("/home/u/.claude/profiles/work/commands"),
        );
        assert_eq!(rel, PathBuf::from("profiles/work/commands"));
    }

    #[test]
    fn test_relative_path_walks_up() {
        let rel = relative_path(Path::new("/a/b/c"), Path::new("/a/x/y"));
        assert_eq!(rel, PathBuf::from("../../x/y"));
    }

    #[test]
    fn test_relative_path_same_dir() {
        assert_eq!(relative_path(Path::new("/a"), Path::new("/a")), PathBuf::from("."));
    }

    #[test]
    fn test_file_timestamp_is_path_safe() {
        let stamp = file_timestamp();
        assert!(!stamp.contains(':'));
        assert!(!stamp.contains('.'));
    }
}
