// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use pretty_assertions::assert_eq;
use storyport_metadata::{
    ExamplesTable, FailureCause, ItemStatus, ItemType, LifecycleEvent, LogLevel,
};
use storyport_runner::{
    config::StoryportConfig,
    mapper::{AFTER_STORIES, BEFORE_STORIES},
    reporter::{PortCall, RecordingPort},
};

fn step_failed(step: &str, message: &str) -> LifecycleEvent {
    LifecycleEvent::StepFailed {
        step: step.to_owned(),
        cause: FailureCause::new(message),
    }
}

fn first_row_events(tail: Vec<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut events = vec![
        begin_suite("Examples", Some(EXAMPLES_STORY)),
        begin_scenario(STOCK_SCENARIO),
        LifecycleEvent::BeginExamples {
            steps: STOCK_STEPS.iter().map(|step| (*step).to_owned()).collect(),
            table: ExamplesTable::new(stock_rows()),
        },
        LifecycleEvent::ExampleRow {
            row: stock_rows().remove(0),
            index: 0,
        },
    ];
    events.extend(tail);
    events.extend([
        LifecycleEvent::EndExamples,
        LifecycleEvent::EndScenario,
        LifecycleEvent::EndSuite,
    ]);
    events
}

const FIRST_ROW_REF: &str = "stories/Examples.story/[SCENARIO:Stock trade alert]\
                             /[EXAMPLE:[symbol:STK1;threshold:10.0;price:5.0;status:OFF]]";

#[test]
fn test_before_scenario_failure_in_example_row() {
    let events = first_row_events(vec![
        step_failed("@BeforeScenario openBrowser", "browser did not start"),
        begin_step(STOCK_STEPS[0]),
        step_successful(STOCK_STEPS[0]),
    ]);
    let (port, _tree) = replay_events(events, &StoryportConfig::default_config());

    let hook = handle(&port, "BeforeScenario");
    let hook_request = port.request_for(hook).expect("hook was created");
    assert_eq!(hook_request.item_type, ItemType::BeforeTest);
    assert_eq!(
        hook_request.code_ref,
        format!("{FIRST_ROW_REF}/[BEFORE:BeforeScenario]")
    );
    let row = port.parent_of(hook).expect("hook has a parent");
    assert_eq!(
        port.request_for(row).expect("row was created").item_type,
        ItemType::Test,
        "the hook hangs off the example row"
    );

    let failing = handle(&port, "@BeforeScenario openBrowser");
    assert_eq!(port.parent_of(failing), Some(hook));
    assert_eq!(
        port.request_for(failing).expect("step was created").code_ref,
        format!("{FIRST_ROW_REF}/[BEFORE:BeforeScenario]/[STEP:@BeforeScenario openBrowser]")
    );
    let logs: Vec<_> = port.logs_for(failing).collect();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, LogLevel::Error);
    assert_eq!(logs[0].message, "browser did not start");

    // The following step belongs to the row, not to the hook.
    let step = handle(&port, "Given a stock of symbol STK1 and a threshold 10.0");
    assert_eq!(port.parent_of(step), Some(row));
    assert_eq!(port.final_status(step), Some(Some(ItemStatus::Passed)));

    assert_eq!(port.final_status(hook), Some(Some(ItemStatus::Failed)));
    assert_eq!(port.final_status(row), Some(Some(ItemStatus::Failed)));
    assert_eq!(status(&port, STOCK_SCENARIO), Some(ItemStatus::Failed));
    assert_eq!(status(&port, "Examples"), Some(ItemStatus::Failed));
}

#[test]
fn test_after_scenario_failure_in_example_row() {
    let events = first_row_events(vec![
        begin_step(STOCK_STEPS[0]),
        step_successful(STOCK_STEPS[0]),
        step_failed("@AfterScenario closeBrowser", "browser crashed"),
    ]);
    let (port, _tree) = replay_events(events, &StoryportConfig::default_config());

    let hook = handle(&port, "AfterScenario");
    let hook_request = port.request_for(hook).expect("hook was created");
    assert_eq!(hook_request.item_type, ItemType::AfterTest);
    assert_eq!(
        hook_request.code_ref,
        format!("{FIRST_ROW_REF}/[AFTER:AfterScenario]")
    );
    assert_eq!(port.final_status(hook), Some(Some(ItemStatus::Failed)));
    assert_eq!(status(&port, STOCK_SCENARIO), Some(ItemStatus::Failed));
}

#[test]
fn test_before_and_after_stories() {
    let events = vec![
        begin_suite(BEFORE_STORIES, None),
        step_failed("@BeforeStories startServer", "port in use"),
        LifecycleEvent::EndSuite,
        begin_suite("Login", Some("stories/login.story")),
        begin_scenario("Log in"),
        begin_step("Given a user"),
        step_successful("Given a user"),
        LifecycleEvent::EndScenario,
        LifecycleEvent::EndSuite,
        begin_suite(AFTER_STORIES, None),
        step_failed("@AfterStories stopServer", "server already stopped"),
        LifecycleEvent::EndSuite,
    ];
    let (port, _tree) = replay_events(events, &StoryportConfig::default_config());

    let roots: Vec<_> = port
        .children_of(None)
        .map(|item| item.request.name.as_str())
        .collect();
    assert_eq!(roots, vec![BEFORE_STORIES, "Login", AFTER_STORIES]);

    let before_story = handle(&port, BEFORE_STORIES);
    let before_hook = port
        .children_of(Some(before_story))
        .next()
        .expect("before-stories hook exists");
    assert_eq!(before_hook.request.item_type, ItemType::BeforeSuite);
    assert_eq!(before_hook.request.name, BEFORE_STORIES);
    assert_eq!(
        before_hook.request.code_ref,
        "BeforeStories/[BEFORE:BeforeStories]"
    );

    let after_story = handle(&port, AFTER_STORIES);
    let after_hook = port
        .children_of(Some(after_story))
        .next()
        .expect("after-stories hook exists");
    assert_eq!(after_hook.request.item_type, ItemType::AfterSuite);
    assert_eq!(
        after_hook.request.code_ref,
        "AfterStories/[AFTER:AfterStories]"
    );

    assert_eq!(status(&port, BEFORE_STORIES), Some(ItemStatus::Failed));
    assert_eq!(status(&port, "Login"), Some(ItemStatus::Passed));
    assert_eq!(status(&port, AFTER_STORIES), Some(ItemStatus::Failed));
}

#[test]
fn test_before_story_hook_closed_before_scenario() {
    let events = vec![
        begin_suite("Login", None),
        step_failed("@BeforeStory seedUsers", "database unavailable"),
        begin_scenario("Log in"),
        LifecycleEvent::EndScenario,
        LifecycleEvent::EndSuite,
    ];
    let (port, _tree) = replay_events(events, &StoryportConfig::default_config());

    let hook = handle(&port, "BeforeStory");
    assert_eq!(
        port.request_for(hook).expect("hook was created").item_type,
        ItemType::BeforeSuite
    );

    let position = |predicate: &dyn Fn(&PortCall) -> bool| {
        port.calls()
            .iter()
            .position(predicate)
            .expect("call was made")
    };
    let hook_closed =
        position(&|call| matches!(call, PortCall::CloseItem { item, .. } if *item == hook));
    let scenario_created = position(&|call| {
        matches!(call, PortCall::CreateItem { request, .. } if request.name == "Log in")
    });
    assert!(
        hook_closed < scenario_created,
        "the hook is closed before the scenario starts"
    );
    assert_eq!(count_items(&port, ItemType::BeforeSuite), 1);
}

fn count_items(port: &RecordingPort, item_type: ItemType) -> usize {
    port.created()
        .filter(|item| item.request.item_type == item_type)
        .count()
}
