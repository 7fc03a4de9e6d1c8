//! Restoring snapshots and rolling back failed switches

use crate::apply::links::{restore_link_value, LinkManager};
use crate::apply::write::{read_json, read_optional, remove_file_if_exists, write_atomic};
use crate::backup::create::{
    snapshot_names, DOC_FILE, MANIFEST_FILE, MCP_SERVERS_FILE, META_FILE, SETTINGS_FILE,
};
use crate::backup::{BackupSummary, RestoreReport, RollbackPlan, SnapshotMeta};
use crate::error::{SwitchError, SwitchResult};
use crate::live::write_mcp_servers;
use crate::profile::ProfileStore;
use crate::util::validate_item_name;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Copy a named snapshot back over live state
///
/// Settings, the doc file and the manifest are written back verbatim when the
/// snapshot holds them; the server map is merged into the secondary config.
/// The registry's active pointer is set to the recorded previous profile.
/// Component links and directories are not touched.
///
/// # Errors
/// Returns not-found if the snapshot does not exist, or an error if a
/// snapshot file cannot be read or a live file cannot be written
pub fn restore_snapshot(store: &ProfileStore, name: &str) -> SwitchResult<RestoreReport> {
    validate_item_name(name)?;
    let paths = store.paths();
    let dir = paths.backups_dir().join(name);
    if !dir.is_dir() {
        return Err(SwitchError::NotFound(format!("Backup '{name}' does not exist")));
    }

    let mut restored = Vec::new();
    for (file, live) in [
        (SETTINGS_FILE, paths.settings()),
        (DOC_FILE, paths.doc_file()),
        (MANIFEST_FILE, paths.manifest()),
    ] {
        if let Some(content) = read_optional(&dir.join(file))? {
            write_atomic(&live, &content)?;
            restored.push(file.to_string());
        }
    }

    let servers_file = dir.join(MCP_SERVERS_FILE);
    if servers_file.is_file() {
        let servers: Map<String, Value> = read_json(&servers_file)?;
        write_mcp_servers(paths.claude_json(), &servers)?;
        restored.push(MCP_SERVERS_FILE.to_string());
    }

    let meta = read_meta(&dir);
    let mut active_profile = None;
    if let Some(previous) = meta.previous_profile {
        let mut registry = store.registry()?;
        registry.active_profile.clone_from(&previous);
        store.save_registry(&registry)?;
        active_profile = Some(previous);
    }

    info!(backup = name, "restored backup");
    Ok(RestoreReport {
        backup: name.to_string(),
        restored,
        active_profile,
        message: format!(
            "Restored backup '{name}'. Please restart Claude Code for changes to take effect."
        ),
    })
}

/// Put every captured file and link back, continuing past failures
///
/// Returns the number of steps that failed; each failure is logged.
pub fn roll_back(plan: &RollbackPlan, links: &dyn LinkManager) -> usize {
    let mut failures = 0;

    for file in &plan.files {
        let result = match &file.original_content {
            Some(content) => write_atomic(&file.path, content),
            None => remove_file_if_exists(&file.path).map(|_| ()),
        };
        // ignored: rollback keeps going so the other files still come back
        if let Err(e) = result {
            warn!(path = %file.path.display(), error = %e, "rollback could not restore file");
            failures += 1;
        }
    }

    for link in &plan.links {
        // ignored: same as above, one bad link must not block the rest
        if let Err(e) = restore_link_value(links, &link.path, link.value.as_deref()) {
            warn!(kind = %link.kind, path = %link.path.display(), error = %e, "rollback could not restore link");
            failures += 1;
        }
    }

    debug!(failures, "rollback finished");
    failures
}

/// List snapshots, newest first
///
/// Snapshots with unreadable files are still listed, with the unreadable
/// parts left empty.
///
/// # Errors
/// Returns an error if the backups directory exists but cannot be read
pub fn list_backups(store: &ProfileStore) -> SwitchResult<Vec<BackupSummary>> {
    let backups = store.paths().backups_dir();
    let names = snapshot_names(&backups).map_err(|e| SwitchError::file(&backups, e))?;

    Ok(names
        .into_iter()
        .rev()
        .map(|name| {
            let dir = backups.join(&name);
            summarize(&dir, name)
        })
        .collect())
}

fn summarize(dir: &Path, name: String) -> BackupSummary {
    let meta = read_meta(dir);
    let settings = read_object(&dir.join(SETTINGS_FILE));
    let servers = read_object(&dir.join(MCP_SERVERS_FILE));

    let plugins = settings
        .get("enabledPlugins")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let (enabled, disabled): (Vec<_>, Vec<_>) = plugins
        .iter()
        .partition(|(_, flag)| flag.as_bool() == Some(true));
    let hooks = settings
        .get("hooks")
        .and_then(Value::as_object)
        .map(|hooks| hooks.keys().cloned().collect())
        .unwrap_or_default();

    let size = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum();

    BackupSummary {
        path: dir.to_path_buf(),
        name,
        previous_profile: meta.previous_profile,
        backup_time: meta.backup_time,
        enabled_plugins: enabled.into_iter().map(|(id, _)| id.clone()).collect(),
        disabled_plugins: disabled.into_iter().map(|(id, _)| id.clone()).collect(),
        hooks,
        mcp_servers: servers.keys().cloned().collect(),
        size,
    }
}

fn read_meta(dir: &Path) -> SnapshotMeta {
    let path = dir.join(META_FILE);
    if !path.is_file() {
        return SnapshotMeta::default();
    }
    read_json(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable backup metadata");
        SnapshotMeta::default()
    })
}

fn read_object(path: &Path) -> Map<String, Value> {
    if !path.is_file() {
        return Map::new();
    }
    read_json(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable backup file");
        Map::new()
    })
}
