//! Locked entry points for every profile operation
//!
//! [`Switcher`] owns the configuration, the profile store, the platform link
//! manager, and the process lock. Every operation that changes live state or
//! the registry runs inside [`ProcessLock::with_lock`]; read-only queries do
//! not lock.

pub mod engine;
pub mod init;
mod types;

pub use types::*;

use crate::apply::links::{ensure_link, platform_links, LinkManager};
use crate::backup::{self, BackupSummary, RestoreReport};
use crate::config::SwitchConfig;
use crate::error::SwitchResult;
use crate::lock::ProcessLock;
use crate::profile::{
    self, ComponentKind, CreateOptions, CreateReport, LiveSnapshot, Profile, ProfileDetails,
    ProfileStore, ProfileSummary, PluginReport, SpreadKind, SpreadReport, Targets,
    CURRENT_PROFILE,
};
use crate::util::validate_profile_name;
use std::path::PathBuf;
use tracing::warn;

/// Profile switcher bound to one set of live paths
#[derive(Debug)]
pub struct Switcher {
    config: SwitchConfig,
    store: ProfileStore,
    links: Box<dyn LinkManager>,
    lock: ProcessLock,
}

impl Switcher {
    #[must_use]
    pub fn new(config: SwitchConfig) -> Self {
        let store = ProfileStore::new(config.paths.clone());
        let links = platform_links(config.link_strategy);
        let lock = ProcessLock::new(config.paths.lock_file(), config.lock);
        Self {
            config,
            store,
            links,
            lock,
        }
    }

    /// Switcher over the home directory, honoring the override variables
    ///
    /// # Errors
    /// Returns an error if no home directory can be found
    pub fn from_env() -> SwitchResult<Self> {
        SwitchConfig::from_env().map(Self::new)
    }

    #[must_use]
    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    #[must_use]
    pub fn links(&self) -> &dyn LinkManager {
        self.links.as_ref()
    }

    /// # Errors
    /// See [`init::init`]
    pub fn init(&self) -> SwitchResult<InitReport> {
        self.lock
            .with_lock(|| init::init(&self.store, self.links.as_ref()))
    }

    /// # Errors
    /// Returns an error if the profiles directory or registry cannot be read
    pub fn list(&self) -> SwitchResult<Vec<ProfileSummary>> {
        self.store.list()
    }

    /// # Errors
    /// Returns not-found if the profile does not exist
    pub fn get(&self, name: &str) -> SwitchResult<ProfileDetails> {
        self.store.get(name)
    }

    /// Create a profile, copying the selected items from live state
    ///
    /// # Errors
    /// See [`ProfileStore::create`]
    pub fn create(&self, name: &str, options: &CreateOptions) -> SwitchResult<CreateReport> {
        self.lock.with_lock(|| {
            let source = if options.copy.is_empty() {
                LiveSnapshot::default()
            } else {
                LiveSnapshot::capture(self.store.paths())?
            };
            self.store.create(name, options, &source)
        })
    }

    /// # Errors
    /// See [`ProfileStore::delete`]
    pub fn delete(&self, name: &str) -> SwitchResult<()> {
        self.lock.with_lock(|| self.store.delete(name))
    }

    /// Rename a profile; when it is the active one, re-point the live links
    ///
    /// # Errors
    /// See [`ProfileStore::rename`]
    pub fn rename(&self, old: &str, new: &str) -> SwitchResult<RenameReport> {
        self.lock.with_lock(|| {
            let was_active = self.store.active_profile()? == old;
            self.store.rename(old, new)?;

            let unlinked = if was_active { self.relink(new) } else { Vec::new() };
            let mut message = format!("Profile '{old}' renamed to '{new}'");
            if !unlinked.is_empty() {
                let kinds: Vec<String> = unlinked.iter().map(ToString::to_string).collect();
                message.push_str(&format!(
                    ". Warning: live {} could not be re-pointed; run 'claude-switch switch {new}' to repair them",
                    kinds.join(", ")
                ));
            }
            Ok(RenameReport {
                old_name: old.to_string(),
                new_name: new.to_string(),
                relinked: was_active && unlinked.is_empty(),
                unlinked,
                message,
            })
        })
    }

    /// Point every live link at `name`, best-effort; returns the kinds that failed
    fn relink(&self, name: &str) -> Vec<ComponentKind> {
        let paths = self.store.paths();
        let mut failed = Vec::new();
        for kind in ComponentKind::ALL {
            let live = paths.component_link(kind);
            let target = paths.profile_component_dir(name, kind);
            if let Err(e) = ensure_link(self.links.as_ref(), &live, &target) {
                warn!(%kind, error = %e, "could not re-point link after rename");
                failed.push(kind);
            }
        }
        failed
    }

    /// Write live state into `name` (default `current`)
    ///
    /// # Errors
    /// Returns a validation error for a bad name, or an error if live state
    /// cannot be read or the profile cannot be written
    pub fn export(&self, name: Option<&str>, description: Option<&str>) -> SwitchResult<Profile> {
        let name = name.unwrap_or(CURRENT_PROFILE);
        validate_profile_name(name)?;
        self.lock.with_lock(|| {
            profile::export_live(
                &self.store,
                name,
                description.unwrap_or("Exported from live settings"),
            )
        })
    }

    /// # Errors
    /// See [`engine::switch_profile`]
    pub fn switch(&self, name: &str) -> SwitchResult<SwitchReport> {
        self.lock
            .with_lock(|| engine::switch_profile(&self.store, self.links.as_ref(), name))
    }

    /// Take a snapshot of live state now
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be written
    pub fn backup(&self) -> SwitchResult<PathBuf> {
        self.lock.with_lock(|| backup::create_snapshot(&self.store))
    }

    /// # Errors
    /// Returns an error if the backups directory cannot be read
    pub fn backups(&self) -> SwitchResult<Vec<BackupSummary>> {
        backup::list_backups(&self.store)
    }

    /// # Errors
    /// See [`backup::restore_snapshot`]
    pub fn restore(&self, name: &str) -> SwitchResult<RestoreReport> {
        self.lock
            .with_lock(|| backup::restore_snapshot(&self.store, name))
    }

    /// # Errors
    /// See [`profile::spread`]
    pub fn spread(
        &self,
        kind: SpreadKind,
        item: Option<&str>,
        targets: &Targets,
        force: bool,
    ) -> SwitchResult<SpreadReport> {
        self.lock
            .with_lock(|| profile::spread(&self.store, kind, item, targets, force))
    }

    /// # Errors
    /// See [`profile::install_plugin`]
    pub fn install_plugin(&self, id: &str, targets: &Targets) -> SwitchResult<PluginReport> {
        self.lock
            .with_lock(|| profile::install_plugin(&self.store, id, targets))
    }

    /// # Errors
    /// See [`profile::uninstall_plugin`]
    pub fn uninstall_plugin(&self, id: &str, targets: &Targets) -> SwitchResult<PluginReport> {
        self.lock
            .with_lock(|| profile::uninstall_plugin(&self.store, id, targets))
    }
}
