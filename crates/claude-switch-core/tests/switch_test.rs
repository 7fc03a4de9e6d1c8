//! Switch engine integration tests

#![cfg(unix)]

mod common;

use claude_switch_core::profile::{CopyItem, CreateOptions, SELF_PLUGIN};
use common::{original_claude_json, original_settings, read_value, Sandbox, ORIGINAL_DOC};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_switch_to_clean_and_back_restores_settings() {
    let sandbox = Sandbox::initialized();

    sandbox.switcher.switch("clean").unwrap();
    let clean = sandbox.settings();
    assert_eq!(clean["enabledPlugins"], json!({ SELF_PLUGIN: true }));
    assert_eq!(clean["hooks"], json!({}));
    assert!(clean.get("statusLine").is_none());
    assert_eq!(clean["env"], json!({}));
    assert_eq!(clean["permissions"], json!({"defaultMode": "default"}));
    assert!(!sandbox.paths().doc_file().exists());
    assert_eq!(sandbox.claude_json()["mcpServers"], json!({}));

    sandbox.switcher.switch("current").unwrap();
    let mut expected = original_settings();
    expected["enabledPlugins"][SELF_PLUGIN] = json!(true);
    assert_eq!(sandbox.settings(), expected);
    assert_eq!(sandbox.claude_json(), original_claude_json());
    assert_eq!(
        fs::read_to_string(sandbox.paths().doc_file()).unwrap(),
        ORIGINAL_DOC
    );
}

#[test]
fn test_switch_preserves_unowned_keys() {
    let sandbox = Sandbox::initialized();
    sandbox.switcher.switch("clean").unwrap();

    let settings = sandbox.settings();
    assert_eq!(settings["model"], "opus");
    assert_eq!(settings["theme"], "dark");

    let claude_json = sandbox.claude_json();
    assert_eq!(claude_json["numStartups"], 12);
    assert_eq!(claude_json["projects"], original_claude_json()["projects"]);
}

#[test]
fn test_switch_keeps_live_file_modes() {
    use std::os::unix::fs::PermissionsExt;

    let sandbox = Sandbox::initialized();
    let settings = sandbox.paths().settings();
    let claude_json = sandbox.paths().claude_json().to_path_buf();
    fs::set_permissions(&settings, fs::Permissions::from_mode(0o644)).unwrap();
    fs::set_permissions(&claude_json, fs::Permissions::from_mode(0o640)).unwrap();

    sandbox.switcher.switch("clean").unwrap();

    let mode = |path: &PathBuf| fs::metadata(path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&settings), 0o644);
    assert_eq!(mode(&claude_json), 0o640);
}

#[test]
fn test_self_plugin_stays_enabled() {
    let sandbox = Sandbox::initialized();
    let mut settings = original_settings();
    settings["enabledPlugins"][SELF_PLUGIN] = json!(false);
    sandbox.write_settings(&settings);

    sandbox.switcher.switch("clean").unwrap();
    assert_eq!(sandbox.settings()["enabledPlugins"][SELF_PLUGIN], true);

    sandbox.switcher.switch("current").unwrap();
    assert_eq!(sandbox.settings()["enabledPlugins"][SELF_PLUGIN], true);
}

#[test]
fn test_switch_relinks_components() {
    let sandbox = Sandbox::initialized();
    sandbox
        .switcher
        .create("work", &CreateOptions::default())
        .unwrap();
    fs::write(
        sandbox.paths().profile_dir("work").join("agents/reviewer.md"),
        "Review\n",
    )
    .unwrap();

    let report = sandbox.switcher.switch("work").unwrap();

    let live = sandbox.paths().claude_dir();
    for kind in ["commands", "skills", "agents"] {
        assert_eq!(
            fs::read_link(live.join(kind)).unwrap(),
            PathBuf::from(format!("profiles/work/{kind}"))
        );
    }
    assert!(live.join("agents/reviewer.md").is_file());
    assert!(!live.join("agents/planner.md").exists());
    assert_eq!(report.components.agents, 1);
    assert_eq!(report.previous_profile, "current");
    assert!(report.backup.is_dir());
    assert_eq!(
        report.message,
        "Switched to profile 'work'. Please restart Claude Code for changes to take effect."
    );
}

#[test]
fn test_switch_commits_registry_and_manifest() {
    let sandbox = Sandbox::initialized();
    assert!(sandbox.registry()["lastSwitch"].is_null());

    sandbox.switcher.switch("clean").unwrap();

    let registry = sandbox.registry();
    assert_eq!(registry["activeProfile"], "clean");
    assert!(registry["lastSwitch"].is_string());

    let manifest = read_value(&sandbox.paths().manifest());
    assert_eq!(manifest["profile"], "clean");
    assert!(manifest["updatedAt"].is_string());
    assert_eq!(manifest["components"]["commands"]["mode"], "whitelist");
    assert_eq!(
        manifest["symlinks"]["commands"],
        "profiles/clean/commands"
    );
    assert_eq!(manifest["symlinks"].as_object().unwrap().len(), 3);
}

#[test]
fn test_switch_reports_live_summary() {
    let sandbox = Sandbox::initialized();
    sandbox.switcher.switch("clean").unwrap();

    let report = sandbox.switcher.switch("current").unwrap();

    assert!(report.settings.plugins.contains(&"formatter@official".to_string()));
    assert!(!report.settings.plugins.contains(&"linter@official".to_string()));
    assert_eq!(report.settings.hooks, vec!["PreToolUse"]);
    assert!(report.settings.status_line);
    assert_eq!(report.settings.mcp_servers, vec!["github"]);
}

#[test]
fn test_back_sync_keeps_live_edits() {
    let sandbox = Sandbox::initialized();

    let mut settings = sandbox.settings();
    settings["env"]["EDITOR"] = json!("nano");
    sandbox.write_settings(&settings);
    let mut claude_json = sandbox.claude_json();
    claude_json["mcpServers"]["notes"] = json!({"command": "notes-mcp"});
    sandbox.write_claude_json(&claude_json);
    fs::write(sandbox.paths().doc_file(), "# Edited live\n").unwrap();

    sandbox.switcher.switch("clean").unwrap();

    let current = sandbox.switcher.store().load("current").unwrap();
    assert_eq!(current.settings.env["EDITOR"], "nano");
    assert!(current.mcp_servers.contains_key("notes"));
    assert_eq!(
        fs::read_to_string(sandbox.paths().profile_doc_file("current")).unwrap(),
        "# Edited live\n"
    );

    sandbox.switcher.switch("current").unwrap();
    assert_eq!(sandbox.settings()["env"]["EDITOR"], "nano");
    assert_eq!(
        fs::read_to_string(sandbox.paths().doc_file()).unwrap(),
        "# Edited live\n"
    );
}

#[test]
fn test_back_sync_removes_doc_missing_live() {
    let sandbox = Sandbox::initialized();
    fs::remove_file(sandbox.paths().doc_file()).unwrap();

    sandbox.switcher.switch("clean").unwrap();

    assert!(!sandbox.paths().profile_doc_file("current").exists());
}

#[test]
fn test_switch_to_missing_profile_touches_nothing() {
    let sandbox = Sandbox::initialized();
    let before = fs::read(sandbox.paths().settings()).unwrap();

    let err = sandbox.switcher.switch("ghost").unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(fs::read(sandbox.paths().settings()).unwrap(), before);
    assert!(sandbox.switcher.backups().unwrap().is_empty());
}

#[test]
fn test_switch_applies_copied_profile() {
    let sandbox = Sandbox::initialized();
    let options = CreateOptions {
        copy: CopyItem::parse_list(&["hooks", "env"]).unwrap(),
        ..CreateOptions::default()
    };
    sandbox.switcher.create("scripts", &options).unwrap();

    sandbox.switcher.switch("scripts").unwrap();

    let settings = sandbox.settings();
    assert_eq!(settings["hooks"], original_settings()["hooks"]);
    assert_eq!(settings["env"], json!({"EDITOR": "vim"}));
    assert_eq!(settings["enabledPlugins"], json!({ SELF_PLUGIN: true }));
    assert_eq!(settings["alwaysThinkingEnabled"], true);
    assert_eq!(settings["autoUpdatesChannel"], "latest");
}

#[test]
fn test_uninitialized_live_directory_is_integrity_error() {
    let sandbox = Sandbox::new();
    sandbox.switcher.export(Some("work"), None).unwrap();

    let err = sandbox.switcher.switch("work").unwrap_err();

    assert_eq!(err.code(), "SWITCH_ROLLED_BACK");
    assert!(err.to_string().contains("Run 'claude-switch init' first"));
    // real user directories are never absorbed or removed
    assert!(sandbox.paths().claude_dir().join("commands/deploy.md").is_file());
}
