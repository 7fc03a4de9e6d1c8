//! The live settings file (`~/.claude/settings.json`)

use crate::apply::write::{read_json_or_default, write_json_atomic};
use crate::error::SwitchResult;
use crate::profile::types::{is_truthy, Permissions, ProfileSettings, SELF_PLUGIN};
use serde_json::{Map, Value};
use std::path::Path;

const ENABLED_PLUGINS: &str = "enabledPlugins";
const HOOKS: &str = "hooks";
const STATUS_LINE: &str = "statusLine";
const ENV: &str = "env";
const PERMISSIONS: &str = "permissions";
const ALWAYS_THINKING: &str = "alwaysThinkingEnabled";
const UPDATES_CHANNEL: &str = "autoUpdatesChannel";

/// Live settings as a whole document
///
/// Profiles own a handful of top-level keys. Every other key belongs to the
/// user or the tool and is written back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveSettings {
    doc: Map<String, Value>,
}

impl LiveSettings {
    /// Read the settings file, or an empty document if it does not exist
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> SwitchResult<Self> {
        Ok(Self {
            doc: read_json_or_default(path)?,
        })
    }

    /// Write the document atomically
    ///
    /// # Errors
    /// Returns an error if the write fails
    pub fn save(&self, path: &Path) -> SwitchResult<()> {
        write_json_atomic(path, &self.doc)
    }

    #[must_use]
    pub fn from_map(doc: Map<String, Value>) -> Self {
        Self { doc }
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.doc
    }

    /// Extract the profile-owned fields, defaulting anything missing
    #[must_use]
    pub fn profile_settings(&self) -> ProfileSettings {
        let defaults = ProfileSettings::default();

        let permissions = self
            .doc
            .get(PERMISSIONS)
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value::<Permissions>(v.clone()).ok())
            .unwrap_or(defaults.permissions);

        ProfileSettings {
            enabled_plugins: self.object(ENABLED_PLUGINS),
            hooks: self.object(HOOKS),
            status_line: self.doc.get(STATUS_LINE).filter(|v| is_truthy(v)).cloned(),
            env: self.object(ENV),
            permissions,
            always_thinking_enabled: self
                .doc
                .get(ALWAYS_THINKING)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.always_thinking_enabled),
            auto_updates_channel: self
                .doc
                .get(UPDATES_CHANNEL)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map_or(defaults.auto_updates_channel, str::to_string),
            extra: Map::new(),
        }
    }

    /// Overwrite the profile-owned fields with those of `settings`
    ///
    /// A missing status line removes the key. The switcher's own plugin is
    /// always left enabled.
    ///
    /// # Errors
    /// Returns an error if the permissions cannot be encoded
    pub fn apply(&mut self, settings: &ProfileSettings) -> SwitchResult<()> {
        self.doc.insert(
            ENABLED_PLUGINS.to_string(),
            Value::Object(settings.enabled_plugins.clone()),
        );
        self.doc
            .insert(HOOKS.to_string(), Value::Object(settings.hooks.clone()));
        match settings.status_line.as_ref().filter(|v| !v.is_null()) {
            Some(status_line) => {
                self.doc.insert(STATUS_LINE.to_string(), status_line.clone());
            }
            None => {
                self.doc.remove(STATUS_LINE);
            }
        }
        self.doc
            .insert(ENV.to_string(), Value::Object(settings.env.clone()));
        self.doc.insert(
            PERMISSIONS.to_string(),
            serde_json::to_value(&settings.permissions)?,
        );
        self.doc.insert(
            ALWAYS_THINKING.to_string(),
            Value::Bool(settings.always_thinking_enabled),
        );
        self.doc.insert(
            UPDATES_CHANNEL.to_string(),
            Value::String(settings.auto_updates_channel.clone()),
        );
        self.set_plugin(SELF_PLUGIN, true);
        Ok(())
    }

    /// Enable or disable a plugin, returning whether anything changed
    pub fn set_plugin(&mut self, id: &str, enabled: bool) -> bool {
        let flag = Value::Bool(enabled);
        if let Some(plugins) = self
            .doc
            .get_mut(ENABLED_PLUGINS)
            .and_then(Value::as_object_mut)
        {
            if plugins.get(id) == Some(&flag) {
                return false;
            }
            plugins.insert(id.to_string(), flag);
        } else {
            let mut plugins = Map::new();
            plugins.insert(id.to_string(), flag);
            self.doc
                .insert(ENABLED_PLUGINS.to_string(), Value::Object(plugins));
        }
        true
    }

    /// Remove a plugin entry, returning whether it was present
    pub fn remove_plugin(&mut self, id: &str) -> bool {
        match self.doc.get_mut(ENABLED_PLUGINS).and_then(Value::as_object_mut) {
            Some(plugins) => plugins.remove(id).is_some(),
            None => false,
        }
    }

    fn object(&self, key: &str) -> Map<String, Value> {
        self.doc
            .get(key)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn live(value: Value) -> LiveSettings {
        match value {
            Value::Object(map) => LiveSettings::from_map(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_profile_settings_defaults() {
        let settings = live(json!({})).profile_settings();
        assert!(settings.enabled_plugins.is_empty());
        assert_eq!(settings.permissions.default_mode, "default");
        assert!(settings.always_thinking_enabled);
        assert_eq!(settings.auto_updates_channel, "latest");
        assert!(settings.status_line.is_none());
    }

    #[test]
    fn test_profile_settings_extracts_owned_fields_only() {
        let settings = live(json!({
            "model": "opus",
            "enabledPlugins": {"a@m": true},
            "statusLine": {"type": "command", "command": "status.sh"},
            "permissions": {"defaultMode": "plan", "deny": ["Bash"]},
            "alwaysThinkingEnabled": false
        }))
        .profile_settings();

        assert_eq!(settings.enabled_plugins["a@m"], true);
        assert!(settings.has_status_line());
        assert_eq!(settings.permissions.default_mode, "plan");
        assert_eq!(settings.permissions.extra["deny"], json!(["Bash"]));
        assert!(!settings.always_thinking_enabled);
        assert!(settings.extra.is_empty());
    }

    #[test]
    fn test_apply_preserves_unowned_keys() {
        let mut doc = live(json!({"model": "opus", "statusLine": "old", "hooks": {"x": []}}));
        let settings = ProfileSettings::default();

        doc.apply(&settings).unwrap();

        let map = doc.as_map();
        assert_eq!(map["model"], "opus");
        assert!(!map.contains_key("statusLine"));
        assert_eq!(map["hooks"], json!({}));
        assert_eq!(map["permissions"]["defaultMode"], "default");
    }

    #[test]
    fn test_apply_forces_self_plugin() {
        let mut doc = live(json!({}));
        let mut settings = ProfileSettings::default();
        settings
            .enabled_plugins
            .insert(SELF_PLUGIN.to_string(), Value::Bool(false));

        doc.apply(&settings).unwrap();

        assert_eq!(doc.as_map()["enabledPlugins"][SELF_PLUGIN], true);
    }

    #[test]
    fn test_set_and_remove_plugin() {
        let mut doc = live(json!({"enabledPlugins": "garbage"}));
        assert!(doc.set_plugin("p@m", true));
        assert!(!doc.set_plugin("p@m", true));
        assert!(doc.remove_plugin("p@m"));
        assert!(!doc.remove_plugin("p@m"));
    }
}
