//! Profile CLI commands
//!
//! Handles: claude-switch init/list/get/switch/create/delete/rename/export

use clap::Args;
use claude_switch_core::profile::{CopyItem, CreateOptions};
use claude_switch_core::{SwitchResult, Switcher};
use serde_json::{json, Value};

use crate::output::success;

/// Arguments for `claude-switch create`
#[derive(Args)]
pub struct CreateArgs {
    /// Profile name
    pub name: String,

    /// Items to copy from live settings (comma-separated): plugins, hooks,
    /// statusline, env, permissions, mcp, claudemd, commands, skills, agents, all
    #[arg(long, value_delimiter = ',', value_name = "ITEMS")]
    pub copy: Vec<String>,

    /// Copy everything from live settings
    #[arg(long, conflicts_with = "copy")]
    pub from_current: bool,

    /// Start components in whitelist mode
    #[arg(long)]
    pub clean: bool,

    /// Profile description
    #[arg(long)]
    pub desc: Option<String>,
}

impl CreateArgs {
    /// Convert to `CreateOptions`
    pub fn to_options(&self) -> SwitchResult<CreateOptions> {
        let mut options = if self.from_current {
            CreateOptions::from_current()
        } else {
            CreateOptions {
                copy: CopyItem::parse_list(&self.copy)?,
                ..CreateOptions::default()
            }
        };
        options.clean = self.clean;
        options.description.clone_from(&self.desc);
        Ok(options)
    }
}

pub fn init(switcher: &Switcher) -> anyhow::Result<Value> {
    success(&switcher.init()?)
}

pub fn list(switcher: &Switcher) -> anyhow::Result<Value> {
    let profiles = switcher.list()?;
    let active = switcher.store().active_profile()?;
    success(&json!({
        "activeProfile": active,
        "count": profiles.len(),
        "profiles": profiles,
    }))
}

pub fn get(switcher: &Switcher, name: &str) -> anyhow::Result<Value> {
    success(&json!({ "profile": switcher.get(name)? }))
}

pub fn switch(switcher: &Switcher, name: &str) -> anyhow::Result<Value> {
    success(&switcher.switch(name)?)
}

pub fn create(switcher: &Switcher, args: &CreateArgs) -> anyhow::Result<Value> {
    let options = args.to_options()?;
    success(&switcher.create(&args.name, &options)?)
}

pub fn delete(switcher: &Switcher, name: &str) -> anyhow::Result<Value> {
    switcher.delete(name)?;
    success(&json!({
        "profile": name,
        "message": format!("Profile '{name}' deleted"),
    }))
}

pub fn rename(switcher: &Switcher, old: &str, new: &str) -> anyhow::Result<Value> {
    success(&switcher.rename(old, new)?)
}

pub fn export(switcher: &Switcher, name: Option<&str>, desc: Option<&str>) -> anyhow::Result<Value> {
    let profile = switcher.export(name, desc)?;
    let message = format!("Live settings exported to profile '{}'", profile.name);
    success(&json!({
        "profile": profile,
        "message": message,
    }))
}
