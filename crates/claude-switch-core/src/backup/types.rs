//! Backup and rollback types

use crate::profile::ComponentKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// `meta.json` of a backup snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    /// Profile that was active when the snapshot was taken
    #[serde(default)]
    pub previous_profile: Option<String>,
    #[serde(default)]
    pub backup_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the backup listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSummary {
    pub name: String,
    pub path: PathBuf,
    pub previous_profile: Option<String>,
    pub backup_time: Option<String>,
    pub enabled_plugins: Vec<String>,
    pub disabled_plugins: Vec<String>,
    pub hooks: Vec<String>,
    pub mcp_servers: Vec<String>,
    /// Approximate size in bytes
    pub size: u64,
}

/// Result of restoring a named snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub backup: String,
    /// Snapshot files written back to live state
    pub restored: Vec<String>,
    /// Registry active pointer after the restore, when the snapshot recorded one
    pub active_profile: Option<String>,
    pub message: String,
}

/// A live file as it was before a switch
#[derive(Debug, Clone)]
pub struct CapturedFile {
    pub path: PathBuf,
    /// Original content (None if the file didn't exist)
    pub original_content: Option<Vec<u8>>,
}

impl CapturedFile {
    /// Check if the file was absent before the switch
    #[must_use]
    pub fn was_absent(&self) -> bool {
        self.original_content.is_none()
    }
}

/// A live component link as it was before a switch
#[derive(Debug, Clone)]
pub struct CapturedLink {
    pub kind: ComponentKind,
    pub path: PathBuf,
    /// Raw link value (None if no link existed)
    pub value: Option<PathBuf>,
}

/// Everything needed to put live state back after a failed switch
#[derive(Debug, Clone, Default)]
pub struct RollbackPlan {
    pub files: Vec<CapturedFile>,
    pub links: Vec<CapturedLink>,
}
