//! Live state locations and runtime configuration
//!
//! Every path the switcher touches is derived from a [`LiveStatePaths`] value,
//! so tests and sandboxes can point the whole system at a temporary directory.

use crate::apply::links::ReplaceStrategy;
use crate::error::{SwitchError, SwitchResult};
use crate::lock::LockConfig;
use crate::profile::ComponentKind;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the live Claude directory (`~/.claude`)
pub const CLAUDE_DIR_ENV: &str = "CLAUDE_DIR_OVERRIDE";

/// Environment variable overriding the secondary config file (`~/.claude.json`)
pub const CLAUDE_JSON_ENV: &str = "CLAUDE_JSON_OVERRIDE";

const SETTINGS_FILE: &str = "settings.json";
const DOC_FILE: &str = "CLAUDE.md";
const MANIFEST_FILE: &str = "active-manifest.json";
const PROFILES_DIR: &str = "profiles";
const BACKUPS_DIR: &str = ".backups";
const REGISTRY_FILE: &str = "profiles.json";
const LOCK_FILE: &str = ".lock";
const PROFILE_RECORD: &str = "profile.json";

/// Locations of live configuration and profile storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStatePaths {
    claude_dir: PathBuf,
    claude_json: PathBuf,
}

impl LiveStatePaths {
    /// Create paths from an explicit live directory and secondary config file
    #[must_use]
    pub fn new(claude_dir: impl Into<PathBuf>, claude_json: impl Into<PathBuf>) -> Self {
        Self {
            claude_dir: claude_dir.into(),
            claude_json: claude_json.into(),
        }
    }

    /// Default layout under a home directory
    #[must_use]
    pub fn from_home(home: &Path) -> Self {
        Self::new(home.join(".claude"), home.join(".claude.json"))
    }

    /// The live Claude directory
    #[must_use]
    pub fn claude_dir(&self) -> &Path {
        &self.claude_dir
    }

    /// The secondary config file holding `mcpServers`
    #[must_use]
    pub fn claude_json(&self) -> &Path {
        &self.claude_json
    }

    #[must_use]
    pub fn settings(&self) -> PathBuf {
        self.claude_dir.join(SETTINGS_FILE)
    }

    #[must_use]
    pub fn doc_file(&self) -> PathBuf {
        self.claude_dir.join(DOC_FILE)
    }

    #[must_use]
    pub fn manifest(&self) -> PathBuf {
        self.claude_dir.join(MANIFEST_FILE)
    }

    /// Live path of a component kind, normally a link into the active profile
    #[must_use]
    pub fn component_link(&self, kind: ComponentKind) -> PathBuf {
        self.claude_dir.join(kind.dir_name())
    }

    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.claude_dir.join(PROFILES_DIR)
    }

    #[must_use]
    pub fn registry(&self) -> PathBuf {
        self.profiles_dir().join(REGISTRY_FILE)
    }

    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.profiles_dir().join(BACKUPS_DIR)
    }

    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.profiles_dir().join(LOCK_FILE)
    }

    /// Directory of a single profile
    #[must_use]
    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.profiles_dir().join(name)
    }

    /// `profile.json` of a single profile
    #[must_use]
    pub fn profile_record(&self, name: &str) -> PathBuf {
        self.profile_dir(name).join(PROFILE_RECORD)
    }

    /// Doc file stored alongside a profile
    #[must_use]
    pub fn profile_doc_file(&self, name: &str) -> PathBuf {
        self.profile_dir(name).join(DOC_FILE)
    }

    /// Component directory inside a profile
    #[must_use]
    pub fn profile_component_dir(&self, name: &str, kind: ComponentKind) -> PathBuf {
        self.profile_dir(name).join(kind.dir_name())
    }
}

/// Runtime configuration for a switcher instance
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    pub paths: LiveStatePaths,
    pub lock: LockConfig,
    /// Link replacement strategy; `None` uses the platform default
    pub link_strategy: Option<ReplaceStrategy>,
}

impl SwitchConfig {
    /// Configuration over explicit paths with default lock timings
    #[must_use]
    pub fn new(paths: LiveStatePaths) -> Self {
        Self {
            paths,
            lock: LockConfig::default(),
            link_strategy: None,
        }
    }

    /// Resolve configuration from the home directory and override variables
    ///
    /// # Errors
    /// Returns an error if no home directory can be found and no override
    /// covers both paths
    pub fn from_env() -> SwitchResult<Self> {
        let dir_override = env::var_os(CLAUDE_DIR_ENV).filter(|v| !v.is_empty());
        let json_override = env::var_os(CLAUDE_JSON_ENV).filter(|v| !v.is_empty());

        let (claude_dir, claude_json) = match (dir_override, json_override) {
            (Some(dir), Some(json)) => (PathBuf::from(dir), PathBuf::from(json)),
            (dir, json) => {
                let home = dirs::home_dir().ok_or(SwitchError::NoHomeDir)?;
                let defaults = LiveStatePaths::from_home(&home);
                (
                    dir.map_or(defaults.claude_dir, PathBuf::from),
                    json.map_or(defaults.claude_json, PathBuf::from),
                )
            }
        };

        Ok(Self::new(LiveStatePaths::new(
            absolutize(claude_dir)?,
            absolutize(claude_json)?,
        )))
    }

    /// Override the live directory and secondary config file
    #[must_use]
    pub fn with_paths(mut self, paths: LiveStatePaths) -> Self {
        self.paths = paths;
        self
    }

    #[must_use]
    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    #[must_use]
    pub fn with_link_strategy(mut self, strategy: ReplaceStrategy) -> Self {
        self.link_strategy = Some(strategy);
        self
    }
}

/// Relative link targets are computed lexically, so every path must be absolute
fn absolutize(path: PathBuf) -> SwitchResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()?.join(path))
    }
}
