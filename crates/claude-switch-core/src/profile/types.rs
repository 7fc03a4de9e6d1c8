//! Profile, registry, and summary types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Plugin that keeps the switcher itself available in every profile
pub const SELF_PLUGIN: &str = "claude-switch@claude-switch";

/// Snapshot of the settings that existed before the profile system
pub const CURRENT_PROFILE: &str = "current";

/// Intentionally empty bootstrap profile
pub const CLEAN_PROFILE: &str = "clean";

/// Format version written to the registry
pub const REGISTRY_VERSION: &str = "2.0.0";

/// A component directory managed through links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Commands,
    Skills,
    Agents,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [
        ComponentKind::Commands,
        ComponentKind::Skills,
        ComponentKind::Agents,
    ];

    /// Directory name, both live and inside a profile
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            ComponentKind::Commands => "commands",
            ComponentKind::Skills => "skills",
            ComponentKind::Agents => "agents",
        }
    }

    /// File extension of single-file items besides `.md`
    #[must_use]
    pub fn item_extension(self) -> &'static str {
        match self {
            ComponentKind::Skills => "skill",
            ComponentKind::Commands | ComponentKind::Agents => "md",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.dir_name() == s)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A named configuration variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Unique name, also the directory name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// When created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When last modified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Settings applied to the live settings file
    #[serde(default)]
    pub settings: ProfileSettings,
    /// MCP server definitions, passed through verbatim
    #[serde(default)]
    pub mcp_servers: Map<String, Value>,
    /// Component selection per kind
    #[serde(default)]
    pub components: Components,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Create an empty profile with default settings
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: String::new(),
            created_at: Some(now),
            updated_at: Some(now),
            settings: ProfileSettings::default(),
            mcp_servers: Map::new(),
            components: Components::default(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_components(mut self, components: Components) -> Self {
        self.components = components;
        self
    }

    /// Mark the profile as modified now
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Settings fields owned by profiles
///
/// Any other top-level key of the live settings file is left alone on switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    /// Plugin id to enabled flag
    #[serde(default)]
    pub enabled_plugins: Map<String, Value>,
    /// Hook event to ordered action list
    #[serde(default)]
    pub hooks: Map<String, Value>,
    /// Status line configuration; `None` removes it from live settings
    #[serde(default)]
    pub status_line: Option<Value>,
    /// Environment variables
    #[serde(default)]
    pub env: Map<String, Value>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default = "default_true")]
    pub always_thinking_enabled: bool,
    #[serde(default = "default_update_channel")]
    pub auto_updates_channel: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            enabled_plugins: Map::new(),
            hooks: Map::new(),
            status_line: None,
            env: Map::new(),
            permissions: Permissions::default(),
            always_thinking_enabled: true,
            auto_updates_channel: default_update_channel(),
            extra: Map::new(),
        }
    }
}

impl ProfileSettings {
    /// Ids of plugins whose flag is `true`
    pub fn enabled_plugin_ids(&self) -> impl Iterator<Item = &str> {
        self.enabled_plugins
            .iter()
            .filter(|(_, enabled)| enabled.as_bool() == Some(true))
            .map(|(id, _)| id.as_str())
    }

    /// Whether a status line is configured
    #[must_use]
    pub fn has_status_line(&self) -> bool {
        self.status_line.as_ref().is_some_and(is_truthy)
    }
}

/// Permission settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default = "default_permission_mode")]
    pub default_mode: String,
    /// `allow`, `deny` and other rule lists
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            default_mode: default_permission_mode(),
            extra: Map::new(),
        }
    }
}

/// Which items of each component kind a profile uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub commands: ComponentSelection,
    #[serde(default)]
    pub skills: ComponentSelection,
    #[serde(default)]
    pub agents: ComponentSelection,
}

impl Components {
    /// Every kind in whitelist mode with nothing included
    #[must_use]
    pub fn whitelist() -> Self {
        let empty = ComponentSelection {
            mode: ComponentMode::Whitelist,
            include: Vec::new(),
        };
        Self {
            commands: empty.clone(),
            skills: empty.clone(),
            agents: empty,
        }
    }

    #[must_use]
    pub fn get(&self, kind: ComponentKind) -> &ComponentSelection {
        match kind {
            ComponentKind::Commands => &self.commands,
            ComponentKind::Skills => &self.skills,
            ComponentKind::Agents => &self.agents,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSelection {
    #[serde(default)]
    pub mode: ComponentMode,
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentMode {
    #[default]
    All,
    Whitelist,
}

/// The profile registry (`profiles/profiles.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    /// Name of the profile currently applied to live state
    #[serde(default = "default_active_profile")]
    pub active_profile: String,
    /// Known profile names
    #[serde(default, deserialize_with = "names_or_records")]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub last_switch: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default = "default_registry_version")]
    pub version: String,
    #[serde(default = "default_true")]
    pub symlink_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            active_profile: default_active_profile(),
            profiles: Vec::new(),
            last_switch: None,
            created_at: None,
            version: default_registry_version(),
            symlink_enabled: true,
            extra: Map::new(),
        }
    }
}

impl Registry {
    /// A fresh registry listing the bootstrap profiles
    #[must_use]
    pub fn bootstrap() -> Self {
        Self {
            profiles: vec![CURRENT_PROFILE.to_string(), CLEAN_PROFILE.to_string()],
            created_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.iter().any(|p| p == name)
    }

    /// Add a name if missing, returning whether it was added
    pub fn add(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.profiles.push(name.to_string());
        true
    }

    pub fn remove(&mut self, name: &str) {
        self.profiles.retain(|p| p != name);
    }

    /// Rename an entry and the active pointer if it refers to `old`
    pub fn rename(&mut self, old: &str, new: &str) {
        for entry in &mut self.profiles {
            if entry == old {
                *entry = new.to_string();
            }
        }
        if !self.contains(new) {
            self.profiles.push(new.to_string());
        }
        if self.active_profile == old {
            self.active_profile = new.to_string();
        }
    }
}

/// Accept `["a", "b"]` as well as `[{"name": "a", ...}]`
fn names_or_records<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name),
            Value::Object(mut record) => match record.remove("name") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            },
            _ => None,
        })
        .collect())
}

/// Which profiles a multi-profile operation touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Every profile on disk
    All,
    /// Only the named profiles
    Only(Vec<String>),
}

impl Targets {
    /// Parse a comma-separated list such as `work,home`
    #[must_use]
    pub fn from_list(list: &str) -> Self {
        Targets::Only(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Item counts of each component directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCounts {
    pub commands: usize,
    pub skills: usize,
    pub agents: usize,
}

impl ComponentCounts {
    pub fn set(&mut self, kind: ComponentKind, count: usize) {
        match kind {
            ComponentKind::Commands => self.commands = count,
            ComponentKind::Skills => self.skills = count,
            ComponentKind::Agents => self.agents = count,
        }
    }
}

/// One row of `list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub plugin_count: usize,
    pub has_hooks: bool,
    pub has_status_line: bool,
    pub mcp_server_count: usize,
    pub components: ComponentCounts,
}

/// Output of `get`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    #[serde(flatten)]
    pub profile: Profile,
    pub active: bool,
    pub enabled_plugins_list: Vec<String>,
    pub hooks_list: Vec<String>,
    pub mcp_servers_list: Vec<String>,
    pub component_counts: ComponentCounts,
}

/// JavaScript-style truthiness, used for "is this setting present"
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn default_true() -> bool {
    true
}

fn default_update_channel() -> String {
    "latest".to_string()
}

fn default_permission_mode() -> String {
    "default".to_string()
}

fn default_active_profile() -> String {
    CURRENT_PROFILE.to_string()
}

fn default_registry_version() -> String {
    REGISTRY_VERSION.to_string()
}
