//! Byte-for-byte rollback tests
//!
//! A switch that fails part way must leave every live file byte-identical
//! and every live link pointing where it pointed before.

#![cfg(unix)]

mod common;

use claude_switch_core::apply::links::SymlinkManager;
use claude_switch_core::backup::{capture_rollback, roll_back};
use claude_switch_core::profile::CreateOptions;
use claude_switch_core::SwitchError;
use common::{hash_file, Sandbox};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Hashes of every live file the switch touches
fn snapshot_files(sandbox: &Sandbox) -> HashMap<PathBuf, Option<String>> {
    let paths = sandbox.paths();
    [
        paths.settings(),
        paths.claude_json().to_path_buf(),
        paths.doc_file(),
        paths.manifest(),
    ]
    .into_iter()
    .map(|path| {
        let hash = hash_file(&path);
        (path, hash)
    })
    .collect()
}

fn link_target(path: &Path) -> Option<PathBuf> {
    fs::read_link(path).ok()
}

/// Replace the live `agents` link with a real directory so linking fails
fn break_agents_link(sandbox: &Sandbox) -> PathBuf {
    let agents = sandbox.paths().claude_dir().join("agents");
    fs::remove_file(&agents).unwrap();
    fs::create_dir(&agents).unwrap();
    fs::write(agents.join("local.md"), "Local agent\n").unwrap();
    agents
}

#[test]
fn test_failed_switch_restores_files_byte_for_byte() {
    let sandbox = Sandbox::initialized();
    sandbox.switcher.switch("clean").unwrap();
    sandbox.switcher.switch("current").unwrap();
    sandbox
        .switcher
        .create("work", &CreateOptions::from_current())
        .unwrap();
    fs::write(sandbox.paths().profile_doc_file("work"), "# Work\n").unwrap();

    let agents = break_agents_link(&sandbox);
    let commands = sandbox.paths().claude_dir().join("commands");
    let skills = sandbox.paths().claude_dir().join("skills");

    let files_before = snapshot_files(&sandbox);
    let commands_before = link_target(&commands);
    let skills_before = link_target(&skills);
    assert!(files_before.values().all(Option::is_some));

    let err = sandbox.switcher.switch("work").unwrap_err();

    assert_eq!(err.code(), "SWITCH_ROLLED_BACK");
    match &err {
        SwitchError::RolledBack { profile, source } => {
            assert_eq!(profile, "work");
            assert_eq!(source.code(), "INTEGRITY_ERROR");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(snapshot_files(&sandbox), files_before);
    assert_eq!(link_target(&commands), commands_before);
    assert_eq!(link_target(&skills), skills_before);
    assert!(agents.join("local.md").is_file());
    assert_eq!(sandbox.registry()["activeProfile"], "current");
}

#[test]
fn test_rollback_removes_files_that_did_not_exist() {
    let sandbox = Sandbox::initialized();
    sandbox
        .switcher
        .create("work", &CreateOptions::default())
        .unwrap();
    fs::write(sandbox.paths().profile_doc_file("work"), "# Work\n").unwrap();
    fs::remove_file(sandbox.paths().doc_file()).unwrap();
    assert!(!sandbox.paths().manifest().exists());

    break_agents_link(&sandbox);
    sandbox.switcher.switch("work").unwrap_err();

    // the doc file is written before linking fails; rollback removes it again
    assert!(!sandbox.paths().doc_file().exists());
    assert!(!sandbox.paths().manifest().exists());
}

#[test]
fn test_rollback_leaves_backup_of_pre_switch_state() {
    let sandbox = Sandbox::initialized();
    let settings_hash = hash_file(&sandbox.paths().settings());
    break_agents_link(&sandbox);

    sandbox.switcher.switch("clean").unwrap_err();

    let backups = sandbox.switcher.backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(hash_file(&backups[0].path.join("settings.json")), settings_hash);
}

#[test]
fn test_roll_back_restores_captured_links() {
    let sandbox = Sandbox::initialized();
    let links = SymlinkManager::default();
    let paths = sandbox.paths();
    let plan = capture_rollback(paths, &links).unwrap();

    let skills = paths.claude_dir().join("skills");
    fs::remove_file(&skills).unwrap();
    std::os::unix::fs::symlink("profiles/clean/skills", &skills).unwrap();
    fs::write(paths.settings(), "{}").unwrap();

    let failures = roll_back(&plan, &links);

    assert_eq!(failures, 0);
    assert_eq!(
        fs::read_link(&skills).unwrap(),
        PathBuf::from("profiles/current/skills")
    );
    assert_ne!(fs::read_to_string(paths.settings()).unwrap(), "{}");
}
