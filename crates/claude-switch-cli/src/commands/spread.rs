//! Spread CLI command
//!
//! Handles: claude-switch spread <type> [item] (--all | --profiles a,b) [--force]

use clap::Args;
use claude_switch_core::profile::{SpreadKind, Targets};
use claude_switch_core::Switcher;
use serde_json::Value;

use crate::output::success;

/// Arguments for `claude-switch spread`
#[derive(Args)]
pub struct SpreadArgs {
    /// Item type: commands, skills, agents, hooks, mcp, env, plugins,
    /// statusline, permissions, claudemd
    #[arg(value_name = "TYPE")]
    pub kind: String,

    /// Item name (not used by statusline, permissions, claudemd)
    pub item: Option<String>,

    /// Spread to every profile except the active one
    #[arg(long, conflicts_with = "profiles")]
    pub all: bool,

    /// Comma-separated target profiles
    #[arg(long, value_name = "NAMES")]
    pub profiles: Option<String>,

    /// Overwrite targets that already have the item
    #[arg(long)]
    pub force: bool,
}

impl SpreadArgs {
    /// Targets selected on the command line; `--all` when none are named
    pub fn targets(&self) -> Targets {
        match &self.profiles {
            Some(list) if !self.all => Targets::from_list(list),
            _ => Targets::All,
        }
    }
}

pub fn execute(switcher: &Switcher, args: &SpreadArgs) -> anyhow::Result<Value> {
    let kind = SpreadKind::parse(&args.kind)?;
    let report = switcher.spread(kind, args.item.as_deref(), &args.targets(), args.force)?;
    success(&report)
}
