//! First-run setup of the profile system
//!
//! Creates the registry and the two bootstrap profiles, moves any real live
//! component directories into `current`, and replaces them with links. Safe
//! to run again: finished steps are detected and skipped.

use crate::apply::links::{ensure_link, LinkFailures, LinkManager};
use crate::error::{SwitchError, SwitchResult};
use crate::profile::{
    export_live, ComponentKind, Components, Profile, ProfileStore, Registry, CLEAN_PROFILE,
    CURRENT_PROFILE,
};
use crate::switch::types::{InitAction, InitComponent, InitReport};
use crate::util::file_timestamp;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_DESCRIPTION: &str = "Snapshot of settings before the profile system";
const CLEAN_DESCRIPTION: &str = "Clean profile with no plugins or customizations";

/// Set up profile storage and live links
///
/// Must run under the process lock.
///
/// # Errors
/// Returns an integrity error if a live component path is a plain file, or
/// an I/O error if a directory cannot be moved or linked
pub fn init(store: &ProfileStore, links: &dyn LinkManager) -> SwitchResult<InitReport> {
    let paths = store.paths();
    for dir in [paths.profiles_dir(), paths.backups_dir()] {
        fs::create_dir_all(&dir).map_err(|e| SwitchError::file(&dir, e))?;
    }

    if !paths.registry().is_file() {
        store.save_registry(&Registry::bootstrap())?;
        debug!("wrote registry");
    }

    if !store.exists(CURRENT_PROFILE) {
        export_live(store, CURRENT_PROFILE, CURRENT_DESCRIPTION)?;
        debug!("captured live state into '{CURRENT_PROFILE}'");
    }

    let mut components = Vec::with_capacity(ComponentKind::ALL.len());
    for kind in ComponentKind::ALL {
        components.push(init_component(store, links, kind)?);
    }

    if !store.exists(CLEAN_PROFILE) {
        let clean = Profile::new(CLEAN_PROFILE)
            .with_description(CLEAN_DESCRIPTION)
            .with_components(Components::whitelist());
        store.save(&clean)?;
        store.ensure_component_dirs(CLEAN_PROFILE)?;
        store.copy_switch_command(CURRENT_PROFILE, CLEAN_PROFILE)?;
        debug!("created '{CLEAN_PROFILE}'");
    }

    let mut registry = store.registry()?;
    let mut changed = false;
    for name in [CURRENT_PROFILE, CLEAN_PROFILE] {
        changed |= registry.add(name);
    }
    if changed {
        store.save_registry(&registry)?;
    }

    info!(active = %registry.active_profile, "profile system initialized");
    Ok(InitReport {
        active_profile: registry.active_profile,
        profiles: store.names()?,
        components,
        message: "Profile system initialized".to_string(),
    })
}

fn init_component(
    store: &ProfileStore,
    links: &dyn LinkManager,
    kind: ComponentKind,
) -> SwitchResult<InitComponent> {
    let paths = store.paths();
    let live = paths.component_link(kind);
    let target = paths.profile_component_dir(CURRENT_PROFILE, kind);

    let meta = match fs::symlink_metadata(&live) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(SwitchError::file(&live, e)),
    };

    let (action, set_aside) = match meta {
        Some(meta) if meta.file_type().is_symlink() => {
            return Ok(InitComponent {
                kind,
                action: InitAction::AlreadyLinked,
                link: None,
                set_aside: None,
            });
        }
        Some(meta) if meta.is_dir() => {
            let set_aside = clear_destination(&target)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| SwitchError::file(parent, e))?;
            }
            fs::rename(&live, &target).map_err(|e| SwitchError::file(&live, e))?;
            debug!(%kind, "moved live directory into '{CURRENT_PROFILE}'");
            (InitAction::Migrated, set_aside)
        }
        Some(_) => {
            return Err(SwitchError::Integrity(format!(
                "'{}' is a file, expected a directory or link",
                live.display()
            )));
        }
        None => {
            fs::create_dir_all(&target).map_err(|e| SwitchError::file(&target, e))?;
            (InitAction::Linked, None)
        }
    };

    let link = ensure_link(links, &live, &target)
        .map_err(|e| SwitchError::from(LinkFailures(vec![(kind, e)])))?;
    Ok(InitComponent {
        kind,
        action,
        link: Some(link),
        set_aside,
    })
}

/// Make room for a migrated directory
///
/// An empty directory is removed; one with content is renamed to
/// `<kind>.backup-<timestamp>` and the new path returned.
fn clear_destination(target: &Path) -> SwitchResult<Option<PathBuf>> {
    if !target.exists() {
        return Ok(None);
    }
    let empty = fs::read_dir(target)
        .map_err(|e| SwitchError::file(target, e))?
        .next()
        .is_none();
    if empty {
        fs::remove_dir(target).map_err(|e| SwitchError::file(target, e))?;
        return Ok(None);
    }

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let aside = target.with_file_name(format!("{name}.backup-{}", file_timestamp()));
    fs::rename(target, &aside).map_err(|e| SwitchError::file(target, e))?;
    Ok(Some(aside))
}
