//! Enable or remove a plugin across several profiles

use crate::error::{SwitchError, SwitchResult};
use crate::live::LiveSettings;
use crate::profile::storage::ProfileStore;
use crate::profile::types::{Targets, SELF_PLUGIN};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginAction {
    Updated,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginOutcome {
    pub profile: String,
    pub action: PluginAction,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PluginSummary {
    pub updated: usize,
    pub skipped: usize,
}

/// Result of an install or uninstall across profiles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginReport {
    pub plugin: String,
    pub results: Vec<PluginOutcome>,
    pub summary: PluginSummary,
    /// Whether live settings were touched because the active profile was targeted
    pub live_updated: bool,
    pub message: String,
}

/// Check that a plugin id looks like `name@marketplace`
///
/// # Errors
/// Returns a validation error for any other shape
pub fn validate_plugin_id(id: &str) -> SwitchResult<()> {
    let valid_part = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    match id.split_once('@') {
        Some((name, market)) if valid_part(name) && valid_part(market) => Ok(()),
        _ => Err(SwitchError::Validation(format!(
            "Invalid plugin id '{id}'. Expected format: name@marketplace"
        ))),
    }
}

/// Enable `id` in every targeted profile
///
/// Profiles where the plugin is already enabled are skipped. `Targets::All`
/// includes the active profile.
///
/// # Errors
/// Returns a validation error for a malformed id and not-found for an unknown
/// target profile
pub fn install_plugin(store: &ProfileStore, id: &str, targets: &Targets) -> SwitchResult<PluginReport> {
    validate_plugin_id(id)?;
    update_profiles(store, id, targets, PluginChange::Enable)
}

/// Remove `id` from every targeted profile
///
/// # Errors
/// Returns a conflict error for the switcher's own plugin, plus the errors of
/// [`install_plugin`]
pub fn uninstall_plugin(store: &ProfileStore, id: &str, targets: &Targets) -> SwitchResult<PluginReport> {
    validate_plugin_id(id)?;
    if id == SELF_PLUGIN {
        return Err(SwitchError::Conflict(format!(
            "Cannot uninstall '{SELF_PLUGIN}': it is required for profile switching"
        )));
    }
    update_profiles(store, id, targets, PluginChange::Remove)
}

#[derive(Debug, Clone, Copy)]
enum PluginChange {
    Enable,
    Remove,
}

fn update_profiles(
    store: &ProfileStore,
    id: &str,
    targets: &Targets,
    change: PluginChange,
) -> SwitchResult<PluginReport> {
    let names = match targets {
        Targets::All => store.names()?,
        Targets::Only(names) => {
            if let Some(missing) = names.iter().find(|name| !store.exists(name)) {
                return Err(SwitchError::profile_not_found(missing));
            }
            names.clone()
        }
    };
    let active = store.active_profile()?;

    let mut results = Vec::with_capacity(names.len());
    let mut summary = PluginSummary::default();
    let mut live_updated = false;
    for name in names {
        let mut profile = store.load(&name)?;
        let plugins = &mut profile.settings.enabled_plugins;
        let changed = match change {
            PluginChange::Enable => {
                if plugins.get(id).and_then(Value::as_bool) == Some(true) {
                    false
                } else {
                    plugins.insert(id.to_string(), Value::Bool(true));
                    true
                }
            }
            PluginChange::Remove => plugins.remove(id).is_some(),
        };

        if changed {
            profile.touch();
            store.save(&profile)?;
        }

        if name == active {
            let path = store.paths().settings();
            let mut live = LiveSettings::load(&path)?;
            let live_changed = match change {
                PluginChange::Enable => live.set_plugin(id, true),
                PluginChange::Remove => live.remove_plugin(id),
            };
            if live_changed {
                live.save(&path)?;
                live_updated = true;
            }
        }

        let action = if changed {
            summary.updated += 1;
            PluginAction::Updated
        } else {
            summary.skipped += 1;
            PluginAction::Skipped
        };
        debug!(profile = %name, plugin = id, ?action, "plugin update");
        results.push(PluginOutcome {
            profile: name,
            action,
        });
    }

    let verb = match change {
        PluginChange::Enable => "Installed",
        PluginChange::Remove => "Uninstalled",
    };
    let message = format!(
        "{verb} '{id}' in {} profile(s), {} skipped",
        summary.updated, summary.skipped
    );
    Ok(PluginReport {
        plugin: id.to_string(),
        results,
        summary,
        live_updated,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_plugin_id() {
        assert!(validate_plugin_id("formatter@official").is_ok());
        assert!(validate_plugin_id("my-tool@team.market").is_ok());
        assert!(validate_plugin_id("formatter").is_err());
        assert!(validate_plugin_id("@official").is_err());
        assert!(validate_plugin_id("formatter@").is_err());
        assert!(validate_plugin_id("a b@c").is_err());
    }
}
