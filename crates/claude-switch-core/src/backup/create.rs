//! Backup snapshots and rollback capture

use crate::apply::links::{read_link_value, LinkManager};
use crate::apply::write::{read_optional, write_atomic, write_json_atomic};
use crate::backup::{CapturedFile, CapturedLink, RollbackPlan, SnapshotMeta};
use crate::config::LiveStatePaths;
use crate::error::{SwitchError, SwitchResult};
use crate::live::read_mcp_servers;
use crate::profile::{ComponentKind, ProfileStore};
use crate::util::{file_timestamp, now_rfc3339};
use serde_json::Map;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix of snapshot directory names
pub const BACKUP_PREFIX: &str = "backup-";

/// Number of snapshots kept after each new one
pub const MAX_BACKUPS: usize = 10;

pub(crate) const SETTINGS_FILE: &str = "settings.json";
pub(crate) const MCP_SERVERS_FILE: &str = "mcpServers.json";
pub(crate) const DOC_FILE: &str = "CLAUDE.md";
pub(crate) const MANIFEST_FILE: &str = "active-manifest.json";
pub(crate) const META_FILE: &str = "meta.json";

/// Copy live state into a new timestamped snapshot directory
///
/// Older snapshots beyond [`MAX_BACKUPS`] are pruned afterwards.
///
/// # Errors
/// Returns an error if live state cannot be read or the snapshot cannot be
/// written
pub fn create_snapshot(store: &ProfileStore) -> SwitchResult<PathBuf> {
    let paths = store.paths();

    // read everything first so a bad live file leaves no snapshot behind
    let settings = read_optional(&paths.settings())?;
    let servers = read_mcp_servers(paths.claude_json())?;
    let doc = read_optional(&paths.doc_file())?;
    let manifest = read_optional(&paths.manifest())?;
    let previous_profile = match store.registry() {
        Ok(registry) => Some(registry.active_profile),
        Err(e) => {
            warn!(error = %e, "registry unreadable, snapshot records no previous profile");
            None
        }
    };
    let meta = SnapshotMeta {
        previous_profile,
        backup_time: Some(now_rfc3339()),
        extra: Map::new(),
    };

    let backups = paths.backups_dir();
    fs::create_dir_all(&backups).map_err(|e| SwitchError::file(&backups, e))?;
    let dir = new_snapshot_dir(&backups)?;

    let fill = || -> SwitchResult<()> {
        if let Some(settings) = &settings {
            write_atomic(&dir.join(SETTINGS_FILE), settings)?;
        }
        write_json_atomic(&dir.join(MCP_SERVERS_FILE), &servers)?;
        if let Some(doc) = &doc {
            write_atomic(&dir.join(DOC_FILE), doc)?;
        }
        if let Some(manifest) = &manifest {
            write_atomic(&dir.join(MANIFEST_FILE), manifest)?;
        }
        write_json_atomic(&dir.join(META_FILE), &meta)
    };

    if let Err(e) = fill() {
        if let Err(cleanup) = fs::remove_dir_all(&dir) {
            warn!(path = %dir.display(), error = %cleanup, "failed to remove partial backup");
        }
        return Err(e);
    }

    debug!(path = %dir.display(), "created backup snapshot");
    prune_snapshots(&backups, MAX_BACKUPS);
    Ok(dir)
}

/// Create `backup-<timestamp>`, adding a counter if the name is taken
fn new_snapshot_dir(backups: &Path) -> SwitchResult<PathBuf> {
    let base = format!("{BACKUP_PREFIX}{}", file_timestamp());
    let mut candidate = backups.join(&base);
    let mut counter = 1;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                candidate = backups.join(format!("{base}-{counter}"));
                counter += 1;
            }
            Err(e) => return Err(SwitchError::file(&candidate, e)),
        }
    }
}

/// Snapshot directory names, oldest first
///
/// # Errors
/// Returns an error if the backups directory exists but cannot be read
pub fn snapshot_names(backups: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(backups) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(BACKUP_PREFIX) && entry.path().is_dir() {
            names.push(name);
        }
    }
    names.sort_by(|a, b| snapshot_order(a).cmp(&snapshot_order(b)));
    Ok(names)
}

/// Sort key: timestamp, then collision counter
fn snapshot_order(name: &str) -> (&str, u32) {
    let stamp = name.trim_start_matches(BACKUP_PREFIX);
    match stamp.rsplit_once("Z-") {
        Some((time, counter)) => (time, counter.parse().unwrap_or(0)),
        None => (stamp.trim_end_matches('Z'), 0),
    }
}

/// Remove the oldest snapshots so at most `keep` remain
pub fn prune_snapshots(backups: &Path, keep: usize) {
    let names = match snapshot_names(backups) {
        Ok(names) => names,
        Err(e) => {
            warn!(error = %e, "could not list backups for pruning");
            return;
        }
    };
    let excess = names.len().saturating_sub(keep);
    for name in names.iter().take(excess) {
        let path = backups.join(name);
        // best-effort: a leftover snapshot is pruned next time
        if let Err(e) = fs::remove_dir_all(&path) {
            warn!(path = %path.display(), error = %e, "failed to prune backup");
        }
    }
}

/// Record the raw bytes of each live file and the raw value of each
/// component link, before anything is changed
///
/// # Errors
/// Returns an error if a live file or link exists but cannot be read
pub fn capture_rollback(paths: &LiveStatePaths, links: &dyn LinkManager) -> SwitchResult<RollbackPlan> {
    let mut plan = RollbackPlan::default();
    for path in [
        paths.settings(),
        paths.claude_json().to_path_buf(),
        paths.doc_file(),
        paths.manifest(),
    ] {
        let original_content = read_optional(&path)?;
        plan.files.push(CapturedFile {
            path,
            original_content,
        });
    }
    for kind in ComponentKind::ALL {
        let path = paths.component_link(kind);
        let value = read_link_value(links, &path).map_err(|e| SwitchError::file(&path, e))?;
        plan.links.push(CapturedLink { kind, path, value });
    }
    Ok(plan)
}
