//! Switch, init, and manifest records

use crate::apply::links::LinkAction;
use crate::profile::{ComponentCounts, ComponentKind, Components, ProfileSettings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// `active-manifest.json`: where the live state came from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveManifest {
    pub profile: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub components: Components,
    /// Link value of each live component path
    #[serde(default)]
    pub symlinks: BTreeMap<ComponentKind, PathBuf>,
}

/// The profile-owned parts of live state after a switch
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSummary {
    pub plugins: Vec<String>,
    pub hooks: Vec<String>,
    pub status_line: bool,
    pub mcp_servers: Vec<String>,
}

impl LiveSummary {
    #[must_use]
    pub fn new(settings: &ProfileSettings, mcp_servers: &Map<String, Value>) -> Self {
        Self {
            plugins: settings.enabled_plugin_ids().map(str::to_string).collect(),
            hooks: settings.hooks.keys().cloned().collect(),
            status_line: settings.has_status_line(),
            mcp_servers: mcp_servers.keys().cloned().collect(),
        }
    }
}

/// Result of a successful switch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchReport {
    pub profile: String,
    pub previous_profile: String,
    /// Snapshot taken before anything changed
    pub backup: PathBuf,
    pub settings: LiveSummary,
    pub components: ComponentCounts,
    pub message: String,
}

/// What `init` did with one live component path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitAction {
    /// Already a link; left as is
    AlreadyLinked,
    /// A real directory was moved into the `current` profile, then linked
    Migrated,
    /// Nothing was there; an empty directory was linked
    Linked,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitComponent {
    pub kind: ComponentKind,
    pub action: InitAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkAction>,
    /// Where an existing `current/<kind>` directory was set aside
    #[serde(rename = "setAside", skip_serializing_if = "Option::is_none")]
    pub set_aside: Option<PathBuf>,
}

/// Result of `init`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub active_profile: String,
    pub profiles: Vec<String>,
    pub components: Vec<InitComponent>,
    pub message: String,
}

/// Result of `rename`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameReport {
    pub old_name: String,
    pub new_name: String,
    /// Whether the live links were re-pointed because the active profile moved
    pub relinked: bool,
    /// Live links left pointing at the old directory
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unlinked: Vec<ComponentKind>,
    pub message: String,
}
