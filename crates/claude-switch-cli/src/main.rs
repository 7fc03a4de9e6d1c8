//! claude-switch CLI - switch Claude Code between configuration profiles
//!
//! Every command prints one JSON document on stdout. Failures print
//! `{"error": ..., "code": ...}` on stderr and exit with status 1.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use claude_switch_core::{LiveStatePaths, SwitchConfig, Switcher};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::plugin::PluginArgs;
use commands::profile::CreateArgs;
use commands::spread::SpreadArgs;
use commands::{backup, plugin, profile, spread};

/// Environment variable holding the log filter
const LOG_ENV: &str = "CLAUDE_SWITCH_LOG";

#[derive(Parser)]
#[command(name = "claude-switch")]
#[command(about = "claude-switch - Claude Code profile switcher")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Live Claude directory (defaults to ~/.claude)
    #[arg(long, global = true, value_name = "DIR")]
    claude_dir: Option<PathBuf>,

    /// Secondary config file (defaults to ~/.claude.json)
    #[arg(long, global = true, value_name = "FILE")]
    claude_json: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the profile system and link component directories
    Init,
    /// List all profiles
    List,
    /// Show profile details
    Get {
        /// Profile name
        name: String,
    },
    /// Switch to a profile
    Switch {
        /// Profile name
        name: String,
    },
    /// Create a new profile
    Create(CreateArgs),
    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
    /// Rename a profile
    Rename {
        /// Current name
        old: String,
        /// New name
        new: String,
    },
    /// Save live settings into a profile
    Export {
        /// Profile name (defaults to current)
        name: Option<String>,
        /// Description used when the profile is new
        #[arg(long)]
        desc: Option<String>,
    },
    /// Snapshot live settings now
    Backup,
    /// List backup snapshots
    Backups,
    /// Restore live settings from a backup snapshot
    Restore {
        /// Backup name (backup-<timestamp>)
        name: String,
    },
    /// Copy one item from the active profile to other profiles
    Spread(SpreadArgs),
    /// Enable a plugin across profiles
    InstallAll(PluginArgs),
    /// Remove a plugin from profiles
    UninstallAll(PluginArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_switcher(cli.claude_dir, cli.claude_json)
        .and_then(|switcher| run(&switcher, cli.command));

    match result {
        Ok(value) => output::print_success(&value),
        Err(e) => {
            output::print_error(&e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build the switcher from the environment, with flags taking precedence
fn load_switcher(
    claude_dir: Option<PathBuf>,
    claude_json: Option<PathBuf>,
) -> anyhow::Result<Switcher> {
    let config = match (claude_dir, claude_json) {
        (Some(dir), Some(json)) => {
            SwitchConfig::new(LiveStatePaths::new(absolute(dir)?, absolute(json)?))
        }
        (dir, json) => {
            let config = SwitchConfig::from_env()?;
            let dir = match dir {
                Some(dir) => absolute(dir)?,
                None => config.paths.claude_dir().to_path_buf(),
            };
            let json = match json {
                Some(json) => absolute(json)?,
                None => config.paths.claude_json().to_path_buf(),
            };
            config.with_paths(LiveStatePaths::new(dir, json))
        }
    };
    Ok(Switcher::new(config))
}

fn absolute(path: PathBuf) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn run(switcher: &Switcher, command: Commands) -> anyhow::Result<Value> {
    match command {
        Commands::Init => profile::init(switcher),
        Commands::List => profile::list(switcher),
        Commands::Get { name } => profile::get(switcher, &name),
        Commands::Switch { name } => profile::switch(switcher, &name),
        Commands::Create(args) => profile::create(switcher, &args),
        Commands::Delete { name } => profile::delete(switcher, &name),
        Commands::Rename { old, new } => profile::rename(switcher, &old, &new),
        Commands::Export { name, desc } => {
            profile::export(switcher, name.as_deref(), desc.as_deref())
        }
        Commands::Backup => backup::create(switcher),
        Commands::Backups => backup::list(switcher),
        Commands::Restore { name } => backup::restore(switcher, &name),
        Commands::Spread(args) => spread::execute(switcher, &args),
        Commands::InstallAll(args) => plugin::install(switcher, &args),
        Commands::UninstallAll(args) => plugin::uninstall(switcher, &args),
    }
}
