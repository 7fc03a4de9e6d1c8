//! Profile directory storage
//!
//! Each profile lives at `profiles/<name>/` and holds a `profile.json`
//! record, an optional `CLAUDE.md`, and `commands/`, `skills/` and `agents/`
//! component directories. The record file is the existence check: a
//! directory without one is not a profile.

use crate::apply::write::{read_json, read_json_or_default, write_json_atomic};
use crate::config::LiveStatePaths;
use crate::error::{SwitchError, SwitchResult};
use crate::profile::snapshot::LiveSnapshot;
use crate::profile::types::{
    ComponentCounts, ComponentKind, Components, Profile, ProfileDetails, ProfileSummary,
    Registry, CURRENT_PROFILE,
};
use crate::util::{cap_description, validate_profile_name};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Maximum directory depth for recursive copies
const MAX_DEPTH: usize = 50;

/// Maximum number of files copied in one recursive copy
const MAX_FILES: usize = 10_000;

/// Command directory every profile needs to be able to switch away again
const SWITCH_COMMAND: &str = "profile";

/// Something `create` can copy from the live configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyItem {
    Plugins,
    Hooks,
    #[serde(rename = "statusline")]
    StatusLine,
    Env,
    Permissions,
    Mcp,
    #[serde(rename = "claudemd")]
    ClaudeMd,
    Commands,
    Skills,
    Agents,
}

impl CopyItem {
    pub const ALL: [CopyItem; 10] = [
        CopyItem::Plugins,
        CopyItem::Hooks,
        CopyItem::StatusLine,
        CopyItem::Env,
        CopyItem::Permissions,
        CopyItem::Mcp,
        CopyItem::ClaudeMd,
        CopyItem::Commands,
        CopyItem::Skills,
        CopyItem::Agents,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CopyItem::Plugins => "plugins",
            CopyItem::Hooks => "hooks",
            CopyItem::StatusLine => "statusline",
            CopyItem::Env => "env",
            CopyItem::Permissions => "permissions",
            CopyItem::Mcp => "mcp",
            CopyItem::ClaudeMd => "claudemd",
            CopyItem::Commands => "commands",
            CopyItem::Skills => "skills",
            CopyItem::Agents => "agents",
        }
    }

    /// The component directory this item copies, if it is one
    #[must_use]
    pub fn component(self) -> Option<ComponentKind> {
        match self {
            CopyItem::Commands => Some(ComponentKind::Commands),
            CopyItem::Skills => Some(ComponentKind::Skills),
            CopyItem::Agents => Some(ComponentKind::Agents),
            _ => None,
        }
    }

    /// Parse a list such as `["plugins", "commands"]` or `["all"]`
    ///
    /// # Errors
    /// Returns a validation error naming every unknown item and the valid set
    pub fn parse_list<S: AsRef<str>>(items: &[S]) -> SwitchResult<Vec<CopyItem>> {
        let items: Vec<&str> = items
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect();

        if items.contains(&"all") {
            return Ok(Self::ALL.to_vec());
        }

        let mut parsed = Vec::new();
        let mut invalid = Vec::new();
        for item in items {
            match Self::ALL.into_iter().find(|c| c.as_str() == item) {
                Some(copy) if !parsed.contains(&copy) => parsed.push(copy),
                Some(_) => {}
                None => invalid.push(item),
            }
        }

        if !invalid.is_empty() {
            let valid: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
            return Err(SwitchError::Validation(format!(
                "Invalid copy items: {}. Valid items: {}, all",
                invalid.join(", "),
                valid.join(", ")
            )));
        }
        Ok(parsed)
    }
}

impl fmt::Display for CopyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`ProfileStore::create`]
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Items copied from the live configuration; everything else is defaulted
    pub copy: Vec<CopyItem>,
    /// Put every component kind in whitelist mode
    pub clean: bool,
    pub description: Option<String>,
}

impl CreateOptions {
    /// Copy everything, as `--from-current` does
    #[must_use]
    pub fn from_current() -> Self {
        Self {
            copy: CopyItem::ALL.to_vec(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn copies(&self, item: CopyItem) -> bool {
        self.copy.contains(&item)
    }
}

/// Result of creating a profile
#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub profile: Profile,
    pub components: ComponentCounts,
    pub message: String,
}

/// CRUD over profile directories and the registry
#[derive(Debug, Clone)]
pub struct ProfileStore {
    paths: LiveStatePaths,
}

impl ProfileStore {
    #[must_use]
    pub fn new(paths: LiveStatePaths) -> Self {
        Self { paths }
    }

    #[must_use]
    pub fn paths(&self) -> &LiveStatePaths {
        &self.paths
    }

    /// Whether `name` is a valid name with a profile record on disk
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        validate_profile_name(name).is_ok() && self.paths.profile_record(name).is_file()
    }

    /// Load a profile record
    ///
    /// # Errors
    /// Returns not-found if the profile does not exist, or a parse error if
    /// its record is corrupt
    pub fn load(&self, name: &str) -> SwitchResult<Profile> {
        if !self.exists(name) {
            return Err(SwitchError::profile_not_found(name));
        }
        read_json(&self.paths.profile_record(name))
    }

    /// Write a profile record, creating its directory if needed
    ///
    /// # Errors
    /// Returns an error if the write fails
    pub fn save(&self, profile: &Profile) -> SwitchResult<()> {
        validate_profile_name(&profile.name)?;
        write_json_atomic(&self.paths.profile_record(&profile.name), profile)
    }

    /// Make sure each component directory of a profile exists
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created
    pub fn ensure_component_dirs(&self, name: &str) -> SwitchResult<()> {
        for kind in ComponentKind::ALL {
            let dir = self.paths.profile_component_dir(name, kind);
            fs::create_dir_all(&dir).map_err(|e| SwitchError::file(&dir, e))?;
        }
        Ok(())
    }

    /// Load the registry, or a default one if it does not exist yet
    ///
    /// # Errors
    /// Returns an error if the registry exists but cannot be parsed
    pub fn registry(&self) -> SwitchResult<Registry> {
        read_json_or_default(&self.paths.registry())
    }

    /// # Errors
    /// Returns an error if the write fails
    pub fn save_registry(&self, registry: &Registry) -> SwitchResult<()> {
        write_json_atomic(&self.paths.registry(), registry)
    }

    /// Name of the active profile
    ///
    /// # Errors
    /// Returns an error if the registry cannot be read
    pub fn active_profile(&self) -> SwitchResult<String> {
        Ok(self.registry()?.active_profile)
    }

    /// Names of every profile on disk, sorted
    ///
    /// # Errors
    /// Returns an error if the profiles directory cannot be read
    pub fn names(&self) -> SwitchResult<Vec<String>> {
        let dir = self.paths.profiles_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SwitchError::file(&dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SwitchError::file(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            if self.exists(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Summaries of every readable profile
    ///
    /// Profiles whose record cannot be parsed are skipped with a warning.
    ///
    /// # Errors
    /// Returns an error if the profiles directory or registry cannot be read
    pub fn list(&self) -> SwitchResult<Vec<ProfileSummary>> {
        let active = self.active_profile()?;
        let mut summaries = Vec::new();

        for name in self.names()? {
            let profile = match self.load(&name) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(profile = %name, error = %e, "skipping unreadable profile");
                    continue;
                }
            };
            summaries.push(ProfileSummary {
                active: active == name,
                description: profile.description.clone(),
                created_at: profile.created_at,
                plugin_count: profile.settings.enabled_plugin_ids().count(),
                has_hooks: !profile.settings.hooks.is_empty(),
                has_status_line: profile.settings.has_status_line(),
                mcp_server_count: profile.mcp_servers.len(),
                components: self.component_counts(&name),
                name,
            });
        }
        Ok(summaries)
    }

    /// Full record of a profile plus derived lists
    ///
    /// # Errors
    /// Returns not-found if the profile does not exist
    pub fn get(&self, name: &str) -> SwitchResult<ProfileDetails> {
        let profile = self.load(name)?;
        let active = self.active_profile()? == name;
        Ok(ProfileDetails {
            active,
            enabled_plugins_list: profile
                .settings
                .enabled_plugin_ids()
                .map(str::to_string)
                .collect(),
            hooks_list: profile.settings.hooks.keys().cloned().collect(),
            mcp_servers_list: profile.mcp_servers.keys().cloned().collect(),
            component_counts: self.component_counts(name),
            profile,
        })
    }

    /// Item counts of each component directory of a profile
    #[must_use]
    pub fn component_counts(&self, name: &str) -> ComponentCounts {
        let mut counts = ComponentCounts::default();
        for kind in ComponentKind::ALL {
            let dir = self.paths.profile_component_dir(name, kind);
            counts.set(kind, count_items(&dir, kind));
        }
        counts
    }

    /// Create a new profile
    ///
    /// Settings items are copied from `source` when requested; component
    /// directories are copied from the active profile when requested and
    /// created empty otherwise.
    ///
    /// # Errors
    /// Returns a validation error for a bad name, a conflict if the profile
    /// exists, or an I/O error. Nothing is left on disk when creation fails.
    pub fn create(
        &self,
        name: &str,
        options: &CreateOptions,
        source: &LiveSnapshot,
    ) -> SwitchResult<CreateReport> {
        validate_profile_name(name)?;
        if self.exists(name) || self.paths.profile_dir(name).exists() {
            return Err(SwitchError::Conflict(format!(
                "Profile '{name}' already exists"
            )));
        }

        let description = match options.description.as_deref().map(cap_description) {
            Some(desc) if !desc.is_empty() => desc,
            _ if options.copy.is_empty() => "Custom profile".to_string(),
            _ => {
                let copied: Vec<&str> = options.copy.iter().map(|c| c.as_str()).collect();
                cap_description(&format!("Copied: {}", copied.join(", ")))
            }
        };

        let components = if options.clean {
            Components::whitelist()
        } else {
            Components::default()
        };
        let mut profile = Profile::new(name)
            .with_description(description)
            .with_components(components);

        let live = &source.settings;
        if options.copies(CopyItem::Plugins) {
            profile.settings.enabled_plugins = live.enabled_plugins.clone();
        }
        if options.copies(CopyItem::Hooks) {
            profile.settings.hooks = live.hooks.clone();
        }
        if options.copies(CopyItem::StatusLine) {
            profile.settings.status_line = live.status_line.clone();
        }
        if options.copies(CopyItem::Env) {
            profile.settings.env = live.env.clone();
        }
        if options.copies(CopyItem::Permissions) {
            profile.settings.permissions = live.permissions.clone();
        }
        if options.copies(CopyItem::Mcp) {
            profile.mcp_servers = source.mcp_servers.clone();
        }

        let mut registry = self.registry()?;
        let source_profile = registry.active_profile.clone();

        let mut populate = || -> SwitchResult<()> {
            self.save(&profile)?;
            if options.copies(CopyItem::ClaudeMd) {
                source.store_doc_file(self, name)?;
            }
            for kind in ComponentKind::ALL {
                let target = self.paths.profile_component_dir(name, kind);
                let wanted = options.copy.iter().any(|c| c.component() == Some(kind));
                let from = self.paths.profile_component_dir(&source_profile, kind);
                if wanted && from.is_dir() {
                    copy_dir_recursive(&from, &target)?;
                } else {
                    fs::create_dir_all(&target).map_err(|e| SwitchError::file(&target, e))?;
                }
            }
            self.copy_switch_command(&source_profile, name)?;

            registry.add(name);
            self.save_registry(&registry)
        };

        if let Err(e) = populate() {
            // best effort: do not leave a half-created profile behind
            let _ = fs::remove_dir_all(self.paths.profile_dir(name));
            return Err(e);
        }

        debug!(profile = name, items = ?options.copy, "created profile");
        Ok(CreateReport {
            components: self.component_counts(name),
            message: format!("Profile '{name}' created"),
            profile,
        })
    }

    /// Copy the `profile` command from one profile to another if it is missing
    ///
    /// # Errors
    /// Returns an error if the copy fails
    pub fn copy_switch_command(&self, from: &str, to: &str) -> SwitchResult<()> {
        let commands = |name| self.paths.profile_component_dir(name, ComponentKind::Commands);
        let src = commands(from).join(SWITCH_COMMAND);
        let dst = commands(to).join(SWITCH_COMMAND);
        if src.is_dir() && !dst.exists() {
            copy_dir_recursive(&src, &dst)?;
        }
        Ok(())
    }

    /// Rename a profile directory and every reference to it
    ///
    /// # Errors
    /// Returns an error if `old` is `current` or missing, or if `new` is
    /// invalid or taken
    pub fn rename(&self, old: &str, new: &str) -> SwitchResult<()> {
        if old == CURRENT_PROFILE {
            return Err(SwitchError::Conflict(
                "Cannot rename 'current' profile - it's a system snapshot".to_string(),
            ));
        }
        if !self.exists(old) {
            return Err(SwitchError::profile_not_found(old));
        }
        validate_profile_name(new)?;
        if self.exists(new) || self.paths.profile_dir(new).exists() {
            return Err(SwitchError::Conflict(format!(
                "Profile '{new}' already exists"
            )));
        }

        let from = self.paths.profile_dir(old);
        let to = self.paths.profile_dir(new);
        fs::rename(&from, &to).map_err(|e| SwitchError::file(&from, e))?;

        let mut profile = self.load(new)?;
        profile.name = new.to_string();
        profile.touch();
        self.save(&profile)?;

        let mut registry = self.registry()?;
        registry.rename(old, new);
        self.save_registry(&registry)?;

        debug!(from = old, to = new, "renamed profile");
        Ok(())
    }

    /// Delete a profile directory and its registry entry
    ///
    /// # Errors
    /// Returns an error if the profile is `current`, active, or missing
    pub fn delete(&self, name: &str) -> SwitchResult<()> {
        if name == CURRENT_PROFILE {
            return Err(SwitchError::Conflict(
                "Cannot delete 'current' profile - it's a system snapshot".to_string(),
            ));
        }
        if !self.exists(name) {
            return Err(SwitchError::profile_not_found(name));
        }

        let mut registry = self.registry()?;
        if registry.active_profile == name {
            return Err(SwitchError::Conflict(format!(
                "Cannot delete active profile '{name}'. Switch to another profile first."
            )));
        }

        let dir = self.paths.profile_dir(name);
        fs::remove_dir_all(&dir).map_err(|e| SwitchError::file(&dir, e))?;

        registry.remove(name);
        self.save_registry(&registry)?;

        debug!(profile = name, "deleted profile");
        Ok(())
    }
}

/// Count items in a component directory
///
/// An item is a subdirectory, a `.md` file, or a file with the kind's own
/// extension. Hidden entries are ignored.
#[must_use]
pub fn count_items(dir: &Path, kind: ComponentKind) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let extension = kind.item_extension();
    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                return false;
            }
            entry.path().is_dir()
                || Path::new(&name)
                    .extension()
                    .is_some_and(|ext| ext == "md" || ext == extension)
        })
        .count()
}

/// Recursively copy a directory
///
/// Symlinks are skipped to prevent loops and directory escape.
///
/// # Errors
/// Returns an error if the copy fails or exceeds the depth or file limits
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> SwitchResult<()> {
    copy_dir_recursive_impl(src, dst, 0, &mut 0)
}

fn copy_dir_recursive_impl(
    src: &Path,
    dst: &Path,
    depth: usize,
    file_count: &mut usize,
) -> SwitchResult<()> {
    if depth > MAX_DEPTH {
        return Err(SwitchError::Integrity(format!(
            "Directory depth exceeds maximum of {MAX_DEPTH}: {}",
            src.display()
        )));
    }

    let src_metadata = match fs::symlink_metadata(src) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(SwitchError::file(src, e)),
    };
    if src_metadata.file_type().is_symlink() {
        return Ok(());
    }

    fs::create_dir_all(dst).map_err(|e| SwitchError::file(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| SwitchError::file(src, e))? {
        let entry = entry.map_err(|e| SwitchError::file(src, e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        let file_type = entry
            .file_type()
            .map_err(|e| SwitchError::file(&src_path, e))?;
        if file_type.is_symlink() {
            debug!(path = %src_path.display(), "skipping symlink during copy");
            continue;
        }

        if file_type.is_dir() {
            copy_dir_recursive_impl(&src_path, &dst_path, depth + 1, file_count)?;
        } else {
            *file_count += 1;
            if *file_count > MAX_FILES {
                return Err(SwitchError::Integrity(format!(
                    "File count exceeds maximum of {MAX_FILES}"
                )));
            }
            fs::copy(&src_path, &dst_path).map_err(|e| SwitchError::file(&src_path, e))?;
        }
    }

    Ok(())
}
