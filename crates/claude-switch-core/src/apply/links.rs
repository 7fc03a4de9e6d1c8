//! Component directory links
//!
//! The live `commands`, `skills` and `agents` directories are links into the
//! active profile. Unix uses relative symlinks; Windows uses directory
//! junctions, which must hold absolute paths.

use crate::profile::ComponentKind;
use crate::util::relative_path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// How an existing link is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceStrategy {
    /// Build the new link beside the old one and rename it into place.
    /// Works while the old link is held open by another process.
    RenameSwap,
    /// Remove the old link, then create the new one
    RemoveThenCreate,
}

/// Platform operations on directory links
pub trait LinkManager: fmt::Debug + Send + Sync {
    /// The raw value stored in a link at `link` that resolves to `target_dir`
    fn link_value(&self, target_dir: &Path, link: &Path) -> PathBuf;

    /// Create a link at `link` holding exactly `value`
    ///
    /// # Errors
    /// Returns an error if the link cannot be created
    fn create_raw(&self, value: &Path, link: &Path) -> io::Result<()>;

    /// Remove the link itself, never what it points to
    ///
    /// # Errors
    /// Returns an error if the link cannot be removed
    fn remove(&self, link: &Path) -> io::Result<()>;

    /// Read the raw value stored in a link
    ///
    /// # Errors
    /// Returns an error if `link` is not a link
    fn read(&self, link: &Path) -> io::Result<PathBuf> {
        fs::read_link(link)
    }

    fn strategy(&self) -> ReplaceStrategy;
}

/// Relative symlinks
#[derive(Debug, Clone, Copy)]
pub struct SymlinkManager {
    strategy: ReplaceStrategy,
}

impl SymlinkManager {
    #[must_use]
    pub fn new(strategy: ReplaceStrategy) -> Self {
        Self { strategy }
    }
}

impl Default for SymlinkManager {
    fn default() -> Self {
        Self::new(ReplaceStrategy::RemoveThenCreate)
    }
}

impl LinkManager for SymlinkManager {
    fn link_value(&self, target_dir: &Path, link: &Path) -> PathBuf {
        let from = link.parent().unwrap_or_else(|| Path::new("."));
        relative_path(from, target_dir)
    }

    #[cfg(unix)]
    fn create_raw(&self, value: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(value, link)
    }

    #[cfg(windows)]
    fn create_raw(&self, value: &Path, link: &Path) -> io::Result<()> {
        std::os::windows::fs::symlink_dir(value, link)
    }

    #[cfg(unix)]
    fn remove(&self, link: &Path) -> io::Result<()> {
        fs::remove_file(link)
    }

    #[cfg(windows)]
    fn remove(&self, link: &Path) -> io::Result<()> {
        fs::remove_dir(link)
    }

    fn strategy(&self) -> ReplaceStrategy {
        self.strategy
    }
}

/// Directory junctions addressed by absolute paths
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct JunctionManager;

#[cfg(windows)]
impl LinkManager for JunctionManager {
    fn link_value(&self, target_dir: &Path, _link: &Path) -> PathBuf {
        target_dir.to_path_buf()
    }

    fn create_raw(&self, value: &Path, link: &Path) -> io::Result<()> {
        junction::create(value, link)
    }

    fn remove(&self, link: &Path) -> io::Result<()> {
        fs::remove_dir(link)
    }

    fn read(&self, link: &Path) -> io::Result<PathBuf> {
        junction::get_target(link)
    }

    fn strategy(&self) -> ReplaceStrategy {
        ReplaceStrategy::RenameSwap
    }
}

/// The link manager for the current platform
#[must_use]
pub fn platform_links(strategy: Option<ReplaceStrategy>) -> Box<dyn LinkManager> {
    #[cfg(windows)]
    {
        match strategy {
            Some(strategy) => Box::new(SymlinkManager::new(strategy)),
            None => Box::new(JunctionManager),
        }
    }
    #[cfg(not(windows))]
    {
        Box::new(SymlinkManager::new(
            strategy.unwrap_or(ReplaceStrategy::RemoveThenCreate),
        ))
    }
}

/// Errors linking a single component path
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("'{0}' is a real directory, not a link. Run 'claude-switch init' first to move it into a profile")]
    RealDirectory(PathBuf),

    #[error("Link target does not exist: {0}")]
    MissingTarget(PathBuf),

    #[error("Failed to link {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Link failures collected across all component kinds
#[derive(Debug)]
pub struct LinkFailures(pub Vec<(ComponentKind, LinkError)>);

impl LinkFailures {
    #[must_use]
    pub fn code(&self) -> &'static str {
        let integrity = self.0.iter().any(|(_, e)| {
            matches!(e, LinkError::RealDirectory(_) | LinkError::MissingTarget(_))
        });
        if integrity {
            "INTEGRITY_ERROR"
        } else {
            "IO_ERROR"
        }
    }
}

impl fmt::Display for LinkFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to link components")?;
        for (i, (kind, error)) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{kind}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LinkFailures {}

/// What [`ensure_link`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAction {
    Created,
    Replaced,
}

/// Make `live` a link to `target_dir`
///
/// An existing link is replaced using the manager's strategy. A real
/// directory is never touched.
///
/// # Errors
/// Returns an error if `live` is a real directory or file, if `target_dir`
/// does not exist, or if the filesystem refuses the change
pub fn ensure_link(
    links: &dyn LinkManager,
    live: &Path,
    target_dir: &Path,
) -> Result<LinkAction, LinkError> {
    if !target_dir.is_dir() {
        return Err(LinkError::MissingTarget(target_dir.to_path_buf()));
    }

    let io_err = |source| LinkError::Io {
        path: live.to_path_buf(),
        source,
    };
    let value = links.link_value(target_dir, live);

    match fs::symlink_metadata(live) {
        Ok(meta) if meta.file_type().is_symlink() => {
            replace_link(links, live, &value).map_err(io_err)?;
            debug!(link = %live.display(), target = %value.display(), "replaced link");
            Ok(LinkAction::Replaced)
        }
        Ok(_) => Err(LinkError::RealDirectory(live.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Some(parent) = live.parent() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            links.create_raw(&value, live).map_err(io_err)?;
            debug!(link = %live.display(), target = %value.display(), "created link");
            Ok(LinkAction::Created)
        }
        Err(e) => Err(io_err(e)),
    }
}

fn replace_link(links: &dyn LinkManager, live: &Path, value: &Path) -> io::Result<()> {
    match links.strategy() {
        ReplaceStrategy::RemoveThenCreate => {
            links.remove(live)?;
            links.create_raw(value, live)
        }
        ReplaceStrategy::RenameSwap => {
            let fresh = sibling(live, "new");
            let retired = sibling(live, "old");

            links.create_raw(value, &fresh)?;
            if let Err(e) = fs::rename(live, &retired) {
                let _ = links.remove(&fresh);
                return Err(e);
            }
            if let Err(e) = fs::rename(&fresh, live) {
                let _ = fs::rename(&retired, live);
                let _ = links.remove(&fresh);
                return Err(e);
            }
            // best effort: the retired link may still be in use
            let _ = links.remove(&retired);
            Ok(())
        }
    }
}

/// A hidden temporary name next to `path`
fn sibling(path: &Path, tag: &str) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "link".into(), |n| n.to_string_lossy().into_owned());
    let nonce: u32 = rand::random();
    path.with_file_name(format!(".{name}.{tag}-{}-{nonce:08x}", std::process::id()))
}

/// Read the raw link value at `live`, or `None` if it is not a link
///
/// # Errors
/// Returns an error if `live` exists but cannot be inspected
pub fn read_link_value(links: &dyn LinkManager, live: &Path) -> io::Result<Option<PathBuf>> {
    match fs::symlink_metadata(live) {
        Ok(meta) if meta.file_type().is_symlink() => links.read(live).map(Some),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Put a link back to a previously read raw value
///
/// `None` means no link existed; any link now at `live` is removed. A real
/// directory at `live` is left alone.
///
/// # Errors
/// Returns an error if the link cannot be removed or recreated
pub fn restore_link_value(
    links: &dyn LinkManager,
    live: &Path,
    value: Option<&Path>,
) -> io::Result<()> {
    match fs::symlink_metadata(live) {
        Ok(meta) if meta.file_type().is_symlink() => links.remove(live)?,
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    match value {
        Some(value) => links.create_raw(value, live),
        None => Ok(()),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join(".claude");
        let work = live.join("profiles/work/commands");
        let home = live.join("profiles/home/commands");
        fs::create_dir_all(&work).unwrap();
        fs::create_dir_all(&home).unwrap();
        fs::write(work.join("deploy.md"), "work").unwrap();
        fs::write(home.join("garden.md"), "home").unwrap();
        (temp, live, work, home)
    }

    fn leftover_temps(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with(".commands."))
            .collect()
    }

    #[test]
    fn test_create_relative_link() {
        let (_temp, live, work, _) = setup();
        let links = SymlinkManager::default();
        let link = live.join("commands");

        let action = ensure_link(&links, &link, &work).unwrap();

        assert_eq!(action, LinkAction::Created);
        assert_eq!(
            fs::read_link(&link).unwrap(),
            PathBuf::from("profiles/work/commands")
        );
        assert!(link.join("deploy.md").exists());
    }

    #[test]
    fn test_replace_with_each_strategy() {
        for strategy in [ReplaceStrategy::RemoveThenCreate, ReplaceStrategy::RenameSwap] {
            let (_temp, live, work, home) = setup();
            let links = SymlinkManager::new(strategy);
            let link = live.join("commands");

            ensure_link(&links, &link, &work).unwrap();
            let action = ensure_link(&links, &link, &home).unwrap();

            assert_eq!(action, LinkAction::Replaced);
            assert!(link.join("garden.md").exists(), "{strategy:?}");
            assert!(!link.join("deploy.md").exists(), "{strategy:?}");
            assert!(work.join("deploy.md").exists(), "target untouched");
            assert!(leftover_temps(&live).is_empty(), "{strategy:?}");
        }
    }

    #[test]
    fn test_real_directory_refused() {
        let (_temp, live, work, _) = setup();
        let links = SymlinkManager::default();
        let link = live.join("commands");
        fs::create_dir_all(&link).unwrap();
        fs::write(link.join("mine.md"), "user data").unwrap();

        let err = ensure_link(&links, &link, &work).unwrap_err();

        assert!(matches!(err, LinkError::RealDirectory(_)));
        assert!(err.to_string().contains("init"));
        assert_eq!(fs::read_to_string(link.join("mine.md")).unwrap(), "user data");
    }

    #[test]
    fn test_missing_target_refused() {
        let (_temp, live, _, _) = setup();
        let links = SymlinkManager::default();

        let err = ensure_link(&links, &live.join("skills"), &live.join("nope")).unwrap_err();

        assert!(matches!(err, LinkError::MissingTarget(_)));
    }

    #[test]
    fn test_read_and_restore_value() {
        let (_temp, live, work, home) = setup();
        let links = SymlinkManager::default();
        let link = live.join("commands");
        ensure_link(&links, &link, &work).unwrap();

        let before = read_link_value(&links, &link).unwrap();
        ensure_link(&links, &link, &home).unwrap();
        restore_link_value(&links, &link, before.as_deref()).unwrap();

        assert_eq!(read_link_value(&links, &link).unwrap(), before);
    }

    #[test]
    fn test_restore_absent_removes_link() {
        let (_temp, live, work, _) = setup();
        let links = SymlinkManager::default();
        let link = live.join("agents");
        assert_eq!(read_link_value(&links, &link).unwrap(), None);
        ensure_link(&links, &link, &work).unwrap();

        restore_link_value(&links, &link, None).unwrap();

        assert!(fs::symlink_metadata(&link).is_err());
        assert!(work.exists());
    }

    #[test]
    fn test_failures_display_every_kind() {
        let failures = LinkFailures(vec![
            (
                ComponentKind::Commands,
                LinkError::RealDirectory(PathBuf::from("/x/commands")),
            ),
            (
                ComponentKind::Agents,
                LinkError::MissingTarget(PathBuf::from("/x/agents")),
            ),
        ]);
        let message = failures.to_string();
        assert!(message.contains("commands:"));
        assert!(message.contains("; agents:"));
        assert_eq!(failures.code(), "INTEGRITY_ERROR");
    }
}
