//! The switch state machine
//!
//! A switch runs in phases: eager checks, backup snapshot, back-sync of the
//! outgoing profile, capture of rollback material, apply, link check, and
//! registry commit. Any failure after the capture puts every captured file
//! and link back before the error is returned.

use crate::apply::links::{ensure_link, LinkFailures, LinkManager};
use crate::apply::write::{read_optional, remove_file_if_exists, write_atomic, write_json_atomic};
use crate::backup::{capture_rollback, create_snapshot, roll_back};
use crate::error::{SwitchError, SwitchResult};
use crate::live::{write_mcp_servers, LiveSettings};
use crate::profile::{back_sync, ComponentKind, Profile, ProfileStore};
use crate::switch::types::{ActiveManifest, LiveSummary, SwitchReport};
use crate::util::validate_profile_name;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Make `target` the live profile
///
/// Must run under the process lock.
///
/// # Errors
/// Returns validation or not-found errors before anything is touched, a
/// snapshot error if the backup cannot be written, or
/// [`SwitchError::RolledBack`] wrapping the failure once live state has been
/// restored
pub fn switch_profile(
    store: &ProfileStore,
    links: &dyn LinkManager,
    target: &str,
) -> SwitchResult<SwitchReport> {
    validate_profile_name(target)?;
    if !store.exists(target) {
        return Err(SwitchError::profile_not_found(target));
    }
    let previous = store.active_profile()?;

    let backup = create_snapshot(store)?;
    debug!(backup = %backup.display(), "snapshot taken");

    match back_sync(store, &previous) {
        Ok(Some(_)) => debug!(profile = %previous, "back-synced outgoing profile"),
        Ok(None) => {}
        // swallowed: live edits stay in the snapshot even if the profile missed them
        Err(e) => warn!(profile = %previous, error = %e, "back-sync failed"),
    }

    let plan = capture_rollback(store.paths(), links)?;
    debug!(files = plan.files.len(), links = plan.links.len(), "rollback material captured");

    let profile = match apply_and_commit(store, links, target) {
        Ok(profile) => profile,
        Err(source) => {
            let failures = roll_back(&plan, links);
            warn!(profile = target, error = %source, failures, "switch failed, rolled back");
            return Err(SwitchError::RolledBack {
                profile: target.to_string(),
                source: Box::new(source),
            });
        }
    };

    info!(from = %previous, to = target, "switched profile");
    Ok(SwitchReport {
        settings: LiveSummary::new(&profile.settings, &profile.mcp_servers),
        components: store.component_counts(target),
        profile: target.to_string(),
        previous_profile: previous,
        backup,
        message: format!(
            "Switched to profile '{target}'. Please restart Claude Code for changes to take effect."
        ),
    })
}

fn apply_and_commit(
    store: &ProfileStore,
    links: &dyn LinkManager,
    target: &str,
) -> SwitchResult<Profile> {
    let paths = store.paths();
    let profile = store.load(target)?;

    let settings_path = paths.settings();
    let mut live = LiveSettings::load(&settings_path)?;
    live.apply(&profile.settings)?;
    live.save(&settings_path)?;
    debug!("applied settings");

    match read_optional(&paths.profile_doc_file(target))? {
        Some(content) => write_atomic(&paths.doc_file(), &content)?,
        None => {
            remove_file_if_exists(&paths.doc_file())?;
        }
    }

    write_mcp_servers(paths.claude_json(), &profile.mcp_servers)?;
    debug!(servers = profile.mcp_servers.len(), "applied MCP servers");

    store.ensure_component_dirs(target)?;
    let symlinks = link_components(store, links, target)?;

    let manifest = ActiveManifest {
        profile: target.to_string(),
        updated_at: Utc::now(),
        components: profile.components.clone(),
        symlinks,
    };
    write_json_atomic(&paths.manifest(), &manifest)?;

    let mut registry = store.registry()?;
    registry.active_profile = target.to_string();
    registry.last_switch = Some(Utc::now());
    registry.add(target);
    store.save_registry(&registry)?;

    Ok(profile)
}

/// Link every component kind, attempting all of them before failing
fn link_components(
    store: &ProfileStore,
    links: &dyn LinkManager,
    target: &str,
) -> SwitchResult<BTreeMap<ComponentKind, PathBuf>> {
    let paths = store.paths();
    let mut symlinks = BTreeMap::new();
    let mut failures = Vec::new();

    for kind in ComponentKind::ALL {
        let live = paths.component_link(kind);
        let target_dir = paths.profile_component_dir(target, kind);
        match ensure_link(links, &live, &target_dir) {
            Ok(action) => {
                debug!(%kind, ?action, "linked component");
                symlinks.insert(kind, links.link_value(&target_dir, &live));
            }
            Err(e) => failures.push((kind, e)),
        }
    }

    if failures.is_empty() {
        Ok(symlinks)
    } else {
        Err(LinkFailures(failures).into())
    }
}
