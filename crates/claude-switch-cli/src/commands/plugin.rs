//! Plugin CLI commands
//!
//! Handles: claude-switch install-all/uninstall-all

use clap::Args;
use claude_switch_core::profile::Targets;
use claude_switch_core::Switcher;
use serde_json::Value;

use crate::output::success;

/// Arguments for `claude-switch install-all` and `uninstall-all`
#[derive(Args)]
pub struct PluginArgs {
    /// Plugin id (name@marketplace)
    pub plugin: String,

    /// Every profile, including the active one
    #[arg(long, conflicts_with = "profiles")]
    pub all: bool,

    /// Comma-separated target profiles
    #[arg(long, value_name = "NAMES")]
    pub profiles: Option<String>,
}

impl PluginArgs {
    pub fn targets(&self) -> Targets {
        match &self.profiles {
            Some(list) if !self.all => Targets::from_list(list),
            _ => Targets::All,
        }
    }
}

pub fn install(switcher: &Switcher, args: &PluginArgs) -> anyhow::Result<Value> {
    success(&switcher.install_plugin(&args.plugin, &args.targets())?)
}

pub fn uninstall(switcher: &Switcher, args: &PluginArgs) -> anyhow::Result<Value> {
    success(&switcher.uninstall_plugin(&args.plugin, &args.targets())?)
}
