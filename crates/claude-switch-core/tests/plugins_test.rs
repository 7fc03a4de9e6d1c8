//! Installing and uninstalling plugins across profiles

mod common;

use claude_switch_core::profile::plugins::PluginAction;
use claude_switch_core::profile::{CreateOptions, Targets, SELF_PLUGIN};
use common::Sandbox;

fn sandbox_with_work() -> Sandbox {
    let sandbox = Sandbox::initialized();
    sandbox
        .switcher
        .create("work", &CreateOptions::default())
        .unwrap();
    sandbox
}

#[test]
fn test_install_everywhere_updates_live_settings() {
    let sandbox = sandbox_with_work();

    let report = sandbox
        .switcher
        .install_plugin("newtool@official", &Targets::All)
        .unwrap();

    assert_eq!(report.summary.updated, 3);
    assert_eq!(report.summary.skipped, 0);
    assert!(report.live_updated);
    for name in ["current", "clean", "work"] {
        let profile = sandbox.switcher.store().load(name).unwrap();
        assert_eq!(profile.settings.enabled_plugins["newtool@official"], true);
    }
    assert_eq!(sandbox.settings()["enabledPlugins"]["newtool@official"], true);
}

#[test]
fn test_install_skips_profiles_that_have_it() {
    let sandbox = sandbox_with_work();

    let report = sandbox
        .switcher
        .install_plugin("formatter@official", &Targets::from_list("current,work"))
        .unwrap();

    assert_eq!(report.results[0].profile, "current");
    assert_eq!(report.results[0].action, PluginAction::Skipped);
    assert_eq!(report.results[1].action, PluginAction::Updated);
    assert!(!report.live_updated);
}

#[test]
fn test_install_enables_disabled_flag() {
    let sandbox = sandbox_with_work();

    let report = sandbox
        .switcher
        .install_plugin("linter@official", &Targets::from_list("current"))
        .unwrap();

    assert_eq!(report.summary.updated, 1);
    assert!(report.live_updated);
    assert_eq!(sandbox.settings()["enabledPlugins"]["linter@official"], true);
}

#[test]
fn test_install_into_inactive_profile_leaves_live_alone() {
    let sandbox = sandbox_with_work();
    let before = sandbox.settings();

    let report = sandbox
        .switcher
        .install_plugin("newtool@official", &Targets::from_list("work"))
        .unwrap();

    assert!(!report.live_updated);
    assert_eq!(sandbox.settings(), before);
}

#[test]
fn test_uninstall_removes_from_profiles_and_live() {
    let sandbox = sandbox_with_work();

    let report = sandbox
        .switcher
        .uninstall_plugin("formatter@official", &Targets::All)
        .unwrap();

    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.summary.skipped, 2);
    assert!(report.live_updated);
    let current = sandbox.switcher.store().load("current").unwrap();
    assert!(!current.settings.enabled_plugins.contains_key("formatter@official"));
    assert!(sandbox.settings()["enabledPlugins"].get("formatter@official").is_none());
}

#[test]
fn test_uninstall_self_plugin_is_conflict() {
    let sandbox = sandbox_with_work();

    let err = sandbox
        .switcher
        .uninstall_plugin(SELF_PLUGIN, &Targets::All)
        .unwrap_err();

    assert_eq!(err.code(), "CONFLICT");
}

#[test]
fn test_plugin_errors() {
    let sandbox = sandbox_with_work();

    let invalid = sandbox
        .switcher
        .install_plugin("not-a-plugin", &Targets::All)
        .unwrap_err();
    assert_eq!(invalid.code(), "VALIDATION_ERROR");

    let missing = sandbox
        .switcher
        .install_plugin("newtool@official", &Targets::from_list("work,ghost"))
        .unwrap_err();
    assert_eq!(missing.code(), "NOT_FOUND");
    // nothing is written when a target is unknown
    let work = sandbox.switcher.store().load("work").unwrap();
    assert!(!work.settings.enabled_plugins.contains_key("newtool@official"));
}
