// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use indoc::indoc;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use storyport_metadata::{Attribute, Issue, ItemStatus};
use storyport_runner::{config::StoryportConfig, launch::SKIPPED_ISSUE_KEY};

fn config_from_repo(contents: &str) -> StoryportConfig {
    let dir = Utf8TempDir::new().expect("created temp dir");
    let config_dir = dir.path().join(".config");
    std::fs::create_dir_all(&config_dir).expect("created .config");
    std::fs::write(config_dir.join("storyport.toml"), contents).expect("wrote config");
    StoryportConfig::from_sources(dir.path(), None).expect("config is valid")
}

const PENDING_RUN: &str = indoc! {r#"
    {"event": "begin-suite", "name": "S"}
    {"event": "begin-scenario", "title": "Sc"}
    {"event": "begin-step", "step": "Given a working step"}
    {"event": "step-successful", "step": "Given a working step"}
    {"event": "step-pending", "step": "When a missing step"}
    {"event": "end-scenario"}
    {"event": "end-suite"}
"#};

#[test]
fn test_skipped_is_not_an_issue() {
    let config = config_from_repo(indoc! {r#"
        [launch]
        skipped-issue = false
    "#});
    let (port, _tree) = replay_jsonl(PENDING_RUN, &config);

    let issues: BTreeMap<_, _> = port
        .closes()
        .map(|closed| {
            let name = port
                .request_for(closed.item)
                .expect("closed items were created")
                .name
                .as_str();
            (name, closed.request.issue.clone())
        })
        .collect();
    assert_eq!(
        issues,
        btreemap! {
            "S" => None,
            "Sc" => None,
            "Given a working step" => None,
            "When a missing step" => Some(Issue::not_issue()),
        }
    );
    assert_eq!(status(&port, "Sc"), Some(ItemStatus::Passed));

    let (_, launch) = port.launch().expect("launch was started");
    assert_eq!(
        launch.attributes,
        vec![Attribute::new(SKIPPED_ISSUE_KEY, "false").into_system()]
    );
}

#[test]
fn test_skipped_issue_default() {
    let (port, _tree) = replay_jsonl(PENDING_RUN, &StoryportConfig::default_config());

    assert!(port.closes().all(|closed| closed.request.issue.is_none()));
    let (_, launch) = port.launch().expect("launch was started");
    assert_eq!(
        launch.attributes,
        vec![Attribute::new(SKIPPED_ISSUE_KEY, "true").into_system()]
    );
}

#[test]
fn test_launch_overrides() {
    let mut config = config_from_repo(indoc! {r#"
        [launch]
        name = "nightly"
        attributes = ["env:ci"]
    "#});
    config
        .set_launch_name("nightly-2")
        .add_launch_attributes([Attribute::tag("rerun")]);

    let (port, _tree) = replay_jsonl(PENDING_RUN, &config);
    let (_, launch) = port.launch().expect("launch was started");
    assert_eq!(launch.name, "nightly-2");
    assert_eq!(
        launch.attributes,
        vec![
            Attribute::new("env", "ci"),
            Attribute::tag("rerun"),
            Attribute::new(SKIPPED_ISSUE_KEY, "true").into_system(),
        ]
    );
}

#[test]
fn test_long_names_truncated() {
    let config = config_from_repo(indoc! {r#"
        [items]
        max-name-length = 10
    "#});
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-step", "step": "Given a very long step"}
            {"event": "step-successful", "step": "Given a very long step"}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &config,
    );

    let step = handle(&port, "Given a v");
    assert_eq!(
        port.request_for(step).expect("step was created").code_ref,
        "S/[SCENARIO:Sc]/[STEP:Given a very long step]",
        "code references keep the full name"
    );
}

#[test]
fn test_empty_name_is_unknown() {
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-step", "step": ""}
            {"event": "step-successful", "step": ""}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    assert_eq!(status(&port, "UNKNOWN"), Some(ItemStatus::Passed));
}
