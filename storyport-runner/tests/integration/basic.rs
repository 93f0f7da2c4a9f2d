// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use indoc::indoc;
use pretty_assertions::assert_eq;
use storyport_metadata::{ItemStatus, ItemType, LogLevel};
use storyport_runner::{config::StoryportConfig, mapper::status::Outcome};

#[test]
fn test_end_to_end_failure() {
    let (port, tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-step", "step": "St1"}
            {"event": "step-successful", "step": "St1"}
            {"event": "begin-step", "step": "St2"}
            {"event": "step-failed", "step": "St2", "cause": {"message": "boom"}}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    let created: Vec<_> = port
        .created()
        .map(|item| (item.request.name.as_str(), item.request.item_type))
        .collect();
    assert_eq!(
        created,
        vec![
            ("S", ItemType::Story),
            ("Sc", ItemType::Scenario),
            ("St1", ItemType::Step),
            ("St2", ItemType::Step),
        ]
    );

    assert_eq!(status(&port, "St1"), Some(ItemStatus::Passed));
    assert_eq!(status(&port, "St2"), Some(ItemStatus::Failed));
    assert_eq!(status(&port, "Sc"), Some(ItemStatus::Failed));
    assert_eq!(status(&port, "S"), Some(ItemStatus::Failed));

    let logs: Vec<_> = port.logs().collect();
    assert_eq!(logs.len(), 1, "exactly one log: the failure");
    let (item, log) = logs[0];
    assert_eq!(item, handle(&port, "St2"));
    assert_eq!(log.level, LogLevel::Error);
    assert_eq!(log.message, "boom");

    assert_eq!(port.closes().count(), 4, "each item closed exactly once");
    assert!(tree.open_nodes().is_empty());
    assert!(port.is_launch_finished());
}

#[test]
fn test_code_references() {
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "A"}
            {"event": "begin-scenario", "title": "B"}
            {"event": "begin-step", "step": "C"}
            {"event": "step-successful", "step": "C"}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    let refs: Vec<_> = port
        .created()
        .map(|item| item.request.code_ref.as_str())
        .collect();
    assert_eq!(refs, vec!["A", "A/[SCENARIO:B]", "A/[SCENARIO:B]/[STEP:C]"]);

    let case_ids: Vec<_> = port
        .created()
        .map(|item| item.request.test_case_id.as_deref())
        .collect();
    assert_eq!(
        case_ids,
        vec![
            Some("A"),
            Some("A/[SCENARIO:B]"),
            Some("A/[SCENARIO:B]/[STEP:C]")
        ],
        "without parameters, the test case ID is the code reference"
    );
}

#[test]
fn test_story_path_is_code_reference() {
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "Login", "path": "stories/login.story", "meta": {"author": "jdoe", "smoke": ""}, "description": "Logging in"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    let story = port
        .request_for(handle(&port, "Login"))
        .expect("story was created");
    assert_eq!(story.code_ref, "stories/login.story");
    assert_eq!(
        story.description.as_deref(),
        Some("Logging in\nauthor:jdoe smoke")
    );
    assert_eq!(story.attributes.len(), 2);
    assert_eq!(
        status(&port, "Login"),
        None,
        "a bare story carries no status"
    );
}

#[test]
fn test_pending_step() {
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "step-pending", "step": "Given I have an unimplemented step"}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    let step = handle(&port, "Given I have an unimplemented step");
    let logs: Vec<_> = port.logs_for(step).collect();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, LogLevel::Warn);
    assert!(
        logs[0]
            .message
            .contains("Unable to locate a step implementation"),
        "unexpected message: {}",
        logs[0].message
    );

    assert_eq!(
        status(&port, "Given I have an unimplemented step"),
        Some(ItemStatus::Skipped)
    );
    assert_eq!(status(&port, "Sc"), Some(ItemStatus::Skipped));
    assert_eq!(status(&port, "S"), Some(ItemStatus::Skipped));

    // With the default config, skipped items are issues to investigate.
    assert!(port.closes().all(|closed| closed.request.issue.is_none()));
}

#[test]
fn test_not_performed_and_ignorable_steps() {
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-step", "step": "Given a failing step"}
            {"event": "step-failed", "step": "Given a failing step", "cause": {"message": "boom", "detail": "at line 1"}}
            {"event": "step-not-performed", "step": "When a later step"}
            {"event": "step-ignorable", "step": "!-- a comment"}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    assert_eq!(status(&port, "When a later step"), Some(ItemStatus::Skipped));
    assert_eq!(status(&port, "!-- a comment"), Some(ItemStatus::Skipped));
    assert_eq!(status(&port, "Sc"), Some(ItemStatus::Failed));

    let failure: Vec<_> = port
        .logs_for(handle(&port, "Given a failing step"))
        .collect();
    assert_eq!(failure[0].message, "boom\nat line 1");

    let not_performed: Vec<_> = port.logs_for(handle(&port, "When a later step")).collect();
    assert_eq!(not_performed.len(), 1);
    assert_eq!(not_performed[0].level, LogLevel::Warn);
    assert_eq!(port.logs_for(handle(&port, "!-- a comment")).count(), 0);
}

#[test]
fn test_duplicate_steps_collapse() {
    let (port, tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-step", "step": "When I click"}
            {"event": "step-successful", "step": "When I click"}
            {"event": "begin-step", "step": "When I click"}
            {"event": "step-successful", "step": "When I click"}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    assert_eq!(
        port.created()
            .filter(|item| item.request.name == "When I click")
            .count(),
        1,
        "identical step text in one scenario resolves to one item"
    );
    let step = handle(&port, "When I click");
    assert_eq!(
        port.closes().filter(|closed| closed.item == step).count(),
        1,
        "the step is closed once"
    );
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_scenarios_expanded_from_meta_are_distinct() {
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "buy <ticker>", "meta": {"ticker": "ACME"}}
            {"event": "begin-step", "step": "When buying"}
            {"event": "step-successful", "step": "When buying"}
            {"event": "end-scenario"}
            {"event": "begin-scenario", "title": "buy <ticker>", "meta": {"ticker": "XYZ"}}
            {"event": "begin-step", "step": "When selling"}
            {"event": "step-failed", "step": "When selling", "cause": {"message": "boom"}}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    let scenarios: Vec<_> = port
        .created()
        .filter(|item| item.request.item_type == ItemType::Scenario)
        .map(|item| (item.request.name.as_str(), item.request.code_ref.as_str()))
        .collect();
    assert_eq!(
        scenarios,
        vec![
            ("buy ACME", "S/[SCENARIO:buy ACME]"),
            ("buy XYZ", "S/[SCENARIO:buy XYZ]"),
        ]
    );
    assert_eq!(
        port.parent_of(handle(&port, "When selling")),
        Some(handle(&port, "buy XYZ"))
    );
    assert_eq!(status(&port, "buy ACME"), Some(ItemStatus::Passed));
    assert_eq!(status(&port, "buy XYZ"), Some(ItemStatus::Failed));
}

#[test]
fn test_nested_story_attaches_to_scenario() {
    let (port, _tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-suite", "name": "Precondition", "path": "given/precondition.story", "nested": true}
            {"event": "begin-scenario", "title": "Set up"}
            {"event": "begin-step", "step": "Given a user"}
            {"event": "step-successful", "step": "Given a user"}
            {"event": "end-scenario"}
            {"event": "end-suite"}
            {"event": "begin-step", "step": "When the user logs in"}
            {"event": "step-successful", "step": "When the user logs in"}
            {"event": "end-scenario"}
            {"event": "end-suite"}
        "#},
        &StoryportConfig::default_config(),
    );

    let scenario = handle(&port, "Sc");
    let nested = handle(&port, "Precondition");
    assert_eq!(port.parent_of(nested), Some(scenario));
    assert_eq!(
        port.request_for(nested).expect("nested story created").code_ref,
        "S/[SCENARIO:Sc]/[STORY:given/precondition.story]"
    );
    assert_eq!(
        port.parent_of(handle(&port, "When the user logs in")),
        Some(scenario),
        "steps after the nested story belong to the outer scenario"
    );
    assert_eq!(status(&port, "Precondition"), Some(ItemStatus::Passed));
    assert_eq!(status(&port, "S"), Some(ItemStatus::Passed));
}

#[test]
fn test_suite_cancelled() {
    let (port, tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-step", "step": "St1"}
            {"event": "step-failed", "step": "St1", "cause": {"message": "boom"}}
            {"event": "begin-step", "step": "St2"}
            {"event": "suite-cancelled"}
        "#},
        &StoryportConfig::default_config(),
    );

    assert_eq!(status(&port, "St1"), Some(ItemStatus::Failed));
    assert_eq!(status(&port, "St2"), Some(ItemStatus::Skipped));
    assert_eq!(
        status(&port, "Sc"),
        Some(ItemStatus::Skipped),
        "cancellation does not fold child outcomes"
    );
    assert_eq!(status(&port, "S"), Some(ItemStatus::Skipped));
    assert!(tree.iter().all(|(_, node)| node.is_closed()));
}

#[test]
fn test_stragglers_closed_as_failed() {
    let (port, tree) = replay_jsonl(
        indoc! {r#"
            {"event": "begin-suite", "name": "S"}
            {"event": "begin-scenario", "title": "Sc"}
            {"event": "begin-step", "step": "St1"}
        "#},
        &StoryportConfig::default_config(),
    );

    for name in ["St1", "Sc", "S"] {
        assert_eq!(status(&port, name), Some(ItemStatus::Failed), "{name}");
    }
    assert!(
        tree.iter()
            .all(|(_, node)| node.outcome() == Outcome::Failed)
    );
}
