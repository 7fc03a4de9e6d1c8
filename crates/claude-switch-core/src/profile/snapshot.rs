//! Profile snapshots taken from live state

use crate::apply::write::{read_optional, remove_file_if_exists, write_atomic};
use crate::config::LiveStatePaths;
use crate::error::SwitchResult;
use crate::live::{read_mcp_servers, LiveSettings};
use crate::profile::storage::ProfileStore;
use crate::profile::types::{Profile, ProfileSettings};
use crate::util::cap_description;
use serde_json::{Map, Value};
use tracing::debug;

/// The profile-owned parts of live state at one moment
#[derive(Debug, Clone, Default)]
pub struct LiveSnapshot {
    pub settings: ProfileSettings,
    pub mcp_servers: Map<String, Value>,
    /// Live `CLAUDE.md`, `None` if absent
    pub doc_file: Option<Vec<u8>>,
}

impl LiveSnapshot {
    /// Read live settings, MCP servers, and the doc file
    ///
    /// # Errors
    /// Returns an error if a live file exists but cannot be read or parsed
    pub fn capture(paths: &LiveStatePaths) -> SwitchResult<Self> {
        Ok(Self {
            settings: LiveSettings::load(&paths.settings())?.profile_settings(),
            mcp_servers: read_mcp_servers(paths.claude_json())?,
            doc_file: read_optional(&paths.doc_file())?,
        })
    }

    /// Copy this snapshot into a profile record
    pub fn apply_to(&self, profile: &mut Profile) {
        let mut settings = self.settings.clone();
        // unknown fields already stored on the profile stay with it
        settings.extra = std::mem::take(&mut profile.settings.extra);
        profile.settings = settings;
        profile.mcp_servers = self.mcp_servers.clone();
        profile.touch();
    }

    /// Store the doc file alongside a profile, or remove the profile's copy
    /// when there is no live doc file
    ///
    /// # Errors
    /// Returns an error if the write or removal fails
    pub fn store_doc_file(&self, store: &ProfileStore, name: &str) -> SwitchResult<()> {
        let path = store.paths().profile_doc_file(name);
        match &self.doc_file {
            Some(content) => write_atomic(&path, content),
            None => remove_file_if_exists(&path).map(|_| ()),
        }
    }
}

/// Write live state into a profile, creating it if needed
///
/// An existing profile keeps its description, creation time, and component
/// selection; a new one gets `description`.
///
/// # Errors
/// Returns an error if live state cannot be read or the profile cannot be
/// written
pub fn export_live(store: &ProfileStore, name: &str, description: &str) -> SwitchResult<Profile> {
    let snapshot = LiveSnapshot::capture(store.paths())?;

    let mut profile = if store.exists(name) {
        store.load(name)?
    } else {
        Profile::new(name).with_description(cap_description(description))
    };
    snapshot.apply_to(&mut profile);

    store.save(&profile)?;
    store.ensure_component_dirs(name)?;
    snapshot.store_doc_file(store, name)?;

    let mut registry = store.registry()?;
    if registry.add(name) {
        store.save_registry(&registry)?;
    }

    debug!(profile = name, "exported live state");
    Ok(profile)
}
