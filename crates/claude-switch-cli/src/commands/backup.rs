//! Backup CLI commands
//!
//! Handles: claude-switch backup/backups/restore

use claude_switch_core::Switcher;
use serde_json::{json, Value};

use crate::output::success;

pub fn create(switcher: &Switcher) -> anyhow::Result<Value> {
    let path = switcher.backup()?;
    success(&json!({
        "backup": path,
        "message": format!("Backup created at {}", path.display()),
    }))
}

pub fn list(switcher: &Switcher) -> anyhow::Result<Value> {
    let backups = switcher.backups()?;
    success(&json!({
        "count": backups.len(),
        "backups": backups,
    }))
}

pub fn restore(switcher: &Switcher, name: &str) -> anyhow::Result<Value> {
    success(&switcher.restore(name)?)
}
