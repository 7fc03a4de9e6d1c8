//! Spread: copy one item from the active profile into other profiles

use crate::apply::write::write_atomic;
use crate::error::{SwitchError, SwitchResult};
use crate::profile::storage::{copy_dir_recursive, ProfileStore};
use crate::profile::types::{ComponentKind, Profile, Targets};
use crate::util::validate_item_name;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What kind of item is being spread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadKind {
    /// A command, skill, or agent file or directory
    Component(ComponentKind),
    /// One hook event
    Hooks,
    /// One MCP server
    Mcp,
    /// One environment variable
    Env,
    /// One plugin flag
    Plugins,
    /// The whole status line
    StatusLine,
    /// The whole permissions object
    Permissions,
    /// The profile's `CLAUDE.md`
    ClaudeMd,
}

impl SpreadKind {
    const NAMES: [&'static str; 10] = [
        "commands",
        "skills",
        "agents",
        "hooks",
        "mcp",
        "env",
        "plugins",
        "statusline",
        "permissions",
        "claudemd",
    ];

    /// Parse a kind name
    ///
    /// # Errors
    /// Returns a validation error listing the valid kinds
    pub fn parse(s: &str) -> SwitchResult<Self> {
        if let Some(kind) = ComponentKind::parse(s) {
            return Ok(SpreadKind::Component(kind));
        }
        match s {
            "hooks" => Ok(SpreadKind::Hooks),
            "mcp" => Ok(SpreadKind::Mcp),
            "env" => Ok(SpreadKind::Env),
            "plugins" => Ok(SpreadKind::Plugins),
            "statusline" => Ok(SpreadKind::StatusLine),
            "permissions" => Ok(SpreadKind::Permissions),
            "claudemd" => Ok(SpreadKind::ClaudeMd),
            other => Err(SwitchError::Validation(format!(
                "Invalid spread type '{other}'. Valid types: {}",
                Self::NAMES.join(", ")
            ))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SpreadKind::Component(kind) => kind.dir_name(),
            SpreadKind::Hooks => "hooks",
            SpreadKind::Mcp => "mcp",
            SpreadKind::Env => "env",
            SpreadKind::Plugins => "plugins",
            SpreadKind::StatusLine => "statusline",
            SpreadKind::Permissions => "permissions",
            SpreadKind::ClaudeMd => "claudemd",
        }
    }

    /// Whether the kind addresses a single named item
    #[must_use]
    pub fn needs_item(self) -> bool {
        !matches!(
            self,
            SpreadKind::StatusLine | SpreadKind::Permissions | SpreadKind::ClaudeMd
        )
    }
}

impl fmt::Display for SpreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadAction {
    Copied,
    Overwritten,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpreadOutcome {
    pub profile: String,
    pub action: SpreadAction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpreadSummary {
    pub copied: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

/// Result of a spread
#[derive(Debug, Clone, Serialize)]
pub struct SpreadReport {
    #[serde(rename = "type")]
    pub kind: String,
    pub item: Option<String>,
    pub source: String,
    pub results: Vec<SpreadOutcome>,
    pub summary: SpreadSummary,
    pub message: String,
}

/// The value being spread, resolved from the source profile
enum SourceValue {
    Path(PathBuf),
    Json(Value),
    Doc(Vec<u8>),
}

/// Copy one item from the active profile into `targets`
///
/// Targets that already have the item are skipped unless `force` is set.
///
/// # Errors
/// Returns a validation error for a missing item name or for targeting the
/// active profile, and not-found for an unknown target or source item
pub fn spread(
    store: &ProfileStore,
    kind: SpreadKind,
    item: Option<&str>,
    targets: &Targets,
    force: bool,
) -> SwitchResult<SpreadReport> {
    let item = if kind.needs_item() {
        let name = item.filter(|s| !s.is_empty()).ok_or_else(|| {
            SwitchError::Validation(format!("Spreading {kind} requires an item name"))
        })?;
        validate_item_name(name)?;
        Some(name)
    } else {
        None
    };

    let source_name = store.active_profile()?;
    let source = store.load(&source_name)?;
    let targets = resolve_targets(store, &source_name, targets)?;
    let value = resolve_source(store, &source, kind, item)?;

    let mut results = Vec::with_capacity(targets.len());
    let mut summary = SpreadSummary::default();
    for target in targets {
        let action = apply_to_target(store, &target, kind, item, &value, force)?;
        match action {
            SpreadAction::Copied => summary.copied += 1,
            SpreadAction::Overwritten => summary.overwritten += 1,
            SpreadAction::Skipped => summary.skipped += 1,
        }
        debug!(profile = %target, kind = %kind, ?action, "spread");
        results.push(SpreadOutcome {
            profile: target,
            action,
        });
    }

    let label = item.map_or_else(|| kind.to_string(), |i| format!("{kind} '{i}'"));
    let message = format!(
        "Spread {label} from '{source_name}': {} copied, {} overwritten, {} skipped",
        summary.copied, summary.overwritten, summary.skipped
    );
    Ok(SpreadReport {
        kind: kind.to_string(),
        item: item.map(str::to_string),
        source: source_name,
        results,
        summary,
        message,
    })
}

fn resolve_targets(store: &ProfileStore, source: &str, targets: &Targets) -> SwitchResult<Vec<String>> {
    let names = match targets {
        Targets::All => store
            .names()?
            .into_iter()
            .filter(|name| name != source)
            .collect(),
        Targets::Only(names) => {
            for name in names {
                if name == source {
                    return Err(SwitchError::Validation(format!(
                        "Cannot spread to the active profile '{name}'"
                    )));
                }
                if !store.exists(name) {
                    return Err(SwitchError::profile_not_found(name));
                }
            }
            names.clone()
        }
    };

    if names.is_empty() {
        return Err(SwitchError::Validation(
            "No target profiles to spread to".to_string(),
        ));
    }
    Ok(names)
}

fn resolve_source(
    store: &ProfileStore,
    source: &Profile,
    kind: SpreadKind,
    item: Option<&str>,
) -> SwitchResult<SourceValue> {
    let missing = || {
        let what = item.map_or_else(|| kind.to_string(), |i| format!("{kind} '{i}'"));
        SwitchError::NotFound(format!("{what} not found in profile '{}'", source.name))
    };
    let keyed = |map: &Map<String, Value>| {
        item.and_then(|i| map.get(i))
            .cloned()
            .map(SourceValue::Json)
            .ok_or_else(missing)
    };

    match kind {
        SpreadKind::Component(component) => {
            let dir = store.paths().profile_component_dir(&source.name, component);
            item.and_then(|i| find_component_item(&dir, component, i))
                .map(SourceValue::Path)
                .ok_or_else(missing)
        }
        SpreadKind::Hooks => keyed(&source.settings.hooks),
        SpreadKind::Env => keyed(&source.settings.env),
        SpreadKind::Plugins => keyed(&source.settings.enabled_plugins),
        SpreadKind::Mcp => keyed(&source.mcp_servers),
        SpreadKind::StatusLine => {
            if source.settings.has_status_line() {
                Ok(SourceValue::Json(
                    source.settings.status_line.clone().unwrap_or(Value::Null),
                ))
            } else {
                Err(missing())
            }
        }
        SpreadKind::Permissions => Ok(SourceValue::Json(serde_json::to_value(
            &source.settings.permissions,
        )?)),
        SpreadKind::ClaudeMd => {
            let path = store.paths().profile_doc_file(&source.name);
            match fs::read(&path) {
                Ok(content) => Ok(SourceValue::Doc(content)),
                Err(_) => Err(missing()),
            }
        }
    }
}

/// Find an item as a directory, `<name>.md`, or `<name>.<ext>`
fn find_component_item(dir: &Path, kind: ComponentKind, name: &str) -> Option<PathBuf> {
    [
        dir.join(name),
        dir.join(format!("{name}.md")),
        dir.join(format!("{name}.{}", kind.item_extension())),
    ]
    .into_iter()
    .find(|candidate| candidate.exists())
}

fn apply_to_target(
    store: &ProfileStore,
    target: &str,
    kind: SpreadKind,
    item: Option<&str>,
    value: &SourceValue,
    force: bool,
) -> SwitchResult<SpreadAction> {
    let outcome = |existed: bool| {
        if existed {
            SpreadAction::Overwritten
        } else {
            SpreadAction::Copied
        }
    };

    match (kind, value) {
        (SpreadKind::Component(component), SourceValue::Path(src)) => {
            let dir = store.paths().profile_component_dir(target, component);
            let Some(file_name) = src.file_name() else {
                return Err(SwitchError::Validation(format!(
                    "Invalid source item {}",
                    src.display()
                )));
            };
            let dst = dir.join(file_name);
            let existed = fs::symlink_metadata(&dst).is_ok();
            if existed && !force {
                return Ok(SpreadAction::Skipped);
            }
            fs::create_dir_all(&dir).map_err(|e| SwitchError::file(&dir, e))?;
            replace_path(src, &dst)?;
            Ok(outcome(existed))
        }
        (SpreadKind::ClaudeMd, SourceValue::Doc(content)) => {
            let dst = store.paths().profile_doc_file(target);
            let existed = dst.exists();
            if existed && !force {
                return Ok(SpreadAction::Skipped);
            }
            write_atomic(&dst, content)?;
            Ok(outcome(existed))
        }
        (_, SourceValue::Json(json)) => {
            let mut profile = store.load(target)?;
            let settings = &mut profile.settings;
            let existed = match kind {
                SpreadKind::Hooks => insert_keyed(&mut settings.hooks, item, json, force),
                SpreadKind::Env => insert_keyed(&mut settings.env, item, json, force),
                SpreadKind::Plugins => {
                    insert_keyed(&mut settings.enabled_plugins, item, json, force)
                }
                SpreadKind::Mcp => insert_keyed(&mut profile.mcp_servers, item, json, force),
                SpreadKind::StatusLine => {
                    let existed = settings.has_status_line();
                    if !existed || force {
                        settings.status_line = Some(json.clone());
                    }
                    existed
                }
                SpreadKind::Permissions => {
                    if force {
                        settings.permissions = serde_json::from_value(json.clone())?;
                    }
                    true
                }
                SpreadKind::Component(_) | SpreadKind::ClaudeMd => {
                    return Err(SwitchError::Validation(format!(
                        "Cannot spread {kind} as a value"
                    )))
                }
            };
            if existed && !force {
                return Ok(SpreadAction::Skipped);
            }
            profile.touch();
            store.save(&profile)?;
            Ok(outcome(existed))
        }
        _ => Err(SwitchError::Validation(format!(
            "Cannot spread {kind} from this source"
        ))),
    }
}

/// Insert `item` unless it exists and `force` is off; returns whether it existed
fn insert_keyed(map: &mut Map<String, Value>, item: Option<&str>, value: &Value, force: bool) -> bool {
    let Some(key) = item else {
        return false;
    };
    let existed = map.contains_key(key);
    if !existed || force {
        map.insert(key.to_string(), value.clone());
    }
    existed
}

/// Copy a file or directory over whatever is at `dst`
fn replace_path(src: &Path, dst: &Path) -> SwitchResult<()> {
    match fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(dst).map_err(|e| SwitchError::file(dst, e))?;
        }
        Ok(_) => fs::remove_file(dst).map_err(|e| SwitchError::file(dst, e))?,
        Err(_) => {}
    }

    if src.is_dir() {
        copy_dir_recursive(src, dst)
    } else {
        fs::copy(src, dst)
            .map(|_| ())
            .map_err(|e| SwitchError::file(src, e))
    }
}
