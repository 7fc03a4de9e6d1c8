//! Shared sandbox for integration tests
//!
//! Each sandbox is a temp directory holding a live `.claude` directory and a
//! `.claude.json`, seeded with realistic pre-existing configuration.

#![allow(dead_code)]

use claude_switch_core::config::LiveStatePaths;
use claude_switch_core::lock::LockConfig;
use claude_switch_core::{SwitchConfig, Switcher};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

pub const ORIGINAL_DOC: &str = "# Home instructions\n\nUse tabs.\n";

pub struct Sandbox {
    pub temp: TempDir,
    pub switcher: Switcher,
}

impl Sandbox {
    /// Seeded live state, not yet initialized
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let paths = LiveStatePaths::new(temp.path().join(".claude"), temp.path().join(".claude.json"));
        seed_live_state(&paths);

        let switcher = Switcher::new(SwitchConfig::new(paths).with_lock(fast_lock()));
        Self { temp, switcher }
    }

    /// Seeded live state after `init`
    pub fn initialized() -> Self {
        let sandbox = Self::new();
        sandbox.switcher.init().expect("init failed");
        sandbox
    }

    pub fn paths(&self) -> &LiveStatePaths {
        self.switcher.store().paths()
    }

    pub fn settings(&self) -> Value {
        read_value(&self.paths().settings())
    }

    pub fn write_settings(&self, value: &Value) {
        fs::write(self.paths().settings(), serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    pub fn claude_json(&self) -> Value {
        read_value(self.paths().claude_json())
    }

    pub fn write_claude_json(&self, value: &Value) {
        fs::write(self.paths().claude_json(), serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    pub fn registry(&self) -> Value {
        read_value(&self.paths().registry())
    }

    pub fn profile_record(&self, name: &str) -> Value {
        read_value(&self.paths().profile_record(name))
    }
}

pub fn fast_lock() -> LockConfig {
    LockConfig {
        timeout: Duration::from_secs(5),
        min_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        ..LockConfig::default()
    }
}

pub fn original_settings() -> Value {
    json!({
        "model": "opus",
        "enabledPlugins": {
            "formatter@official": true,
            "linter@official": false
        },
        "hooks": {
            "PreToolUse": [{"matcher": "Bash", "hooks": [{"type": "command", "command": "audit.sh"}]}]
        },
        "statusLine": {"type": "command", "command": "status.sh"},
        "env": {"EDITOR": "vim"},
        "permissions": {"defaultMode": "acceptEdits", "allow": ["Read"]},
        "alwaysThinkingEnabled": false,
        "autoUpdatesChannel": "stable",
        "theme": "dark"
    })
}

pub fn original_claude_json() -> Value {
    json!({
        "numStartups": 12,
        "mcpServers": {
            "github": {"command": "github-mcp", "args": ["--stdio"]}
        },
        "projects": {"/work/app": {"allowedTools": []}}
    })
}

fn seed_live_state(paths: &LiveStatePaths) {
    let dir = paths.claude_dir();
    fs::create_dir_all(dir.join("commands/profile")).unwrap();
    fs::create_dir_all(dir.join("skills/review")).unwrap();
    fs::create_dir_all(dir.join("agents")).unwrap();

    fs::write(
        paths.settings(),
        serde_json::to_string_pretty(&original_settings()).unwrap(),
    )
    .unwrap();
    fs::write(
        paths.claude_json(),
        serde_json::to_string_pretty(&original_claude_json()).unwrap(),
    )
    .unwrap();
    fs::write(paths.doc_file(), ORIGINAL_DOC).unwrap();

    fs::write(dir.join("commands/deploy.md"), "Deploy the app\n").unwrap();
    fs::write(dir.join("commands/profile/switch.md"), "Switch profiles\n").unwrap();
    fs::write(dir.join("skills/review/SKILL.md"), "Review code\n").unwrap();
    fs::write(dir.join("agents/planner.md"), "Plan work\n").unwrap();
}

pub fn read_value(path: &Path) -> Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap()
}

/// Compute SHA256 hash of file content
pub fn hash_file(path: &Path) -> Option<String> {
    if path.is_file() {
        let content = fs::read(path).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&content);
        Some(hex::encode(hasher.finalize()))
    } else {
        None
    }
}
