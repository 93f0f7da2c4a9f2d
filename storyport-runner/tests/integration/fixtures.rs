// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use std::io::Cursor;
use storyport_metadata::{
    ExampleRow, ExamplesTable, ItemStatus, LifecycleEvent, ScenarioDefinition,
};
use storyport_runner::{
    config::StoryportConfig,
    launch::LaunchSession,
    mapper::{ItemHandle, tree::ExecutionTree},
    replay::{EventReader, replay},
    reporter::RecordingPort,
};

pub(crate) const EXAMPLES_STORY: &str = "stories/Examples.story";
pub(crate) const STOCK_SCENARIO: &str = "Stock trade alert";

pub(crate) const STOCK_STEPS: [&str; 4] = [
    "Given a stock of symbol <symbol> and a threshold <threshold>",
    "When the stock is traded at price <price>",
    "Then the alert status should be status <status>",
    "When I have first parameter <symbol> and second parameter <symbol>",
];

/// Replays JSON-lines events through a fresh launch session.
pub(crate) fn replay_jsonl(
    input: &str,
    config: &StoryportConfig,
) -> (RecordingPort, ExecutionTree) {
    let mut session = LaunchSession::start(RecordingPort::new(), config);
    replay(EventReader::new("<fixture>", Cursor::new(input)), &mut session)
        .expect("fixture events replay cleanly");
    session.finish()
}

/// Replays events through a fresh launch session.
pub(crate) fn replay_events(
    events: impl IntoIterator<Item = LifecycleEvent>,
    config: &StoryportConfig,
) -> (RecordingPort, ExecutionTree) {
    let mut session = LaunchSession::start(RecordingPort::new(), config);
    replay(events.into_iter().map(Ok), &mut session).expect("fixture events replay cleanly");
    session.finish()
}

pub(crate) fn row(pairs: &[(&str, &str)]) -> ExampleRow {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect::<IndexMap<_, _>>()
}

pub(crate) fn stock_rows() -> Vec<ExampleRow> {
    vec![
        row(&[
            ("symbol", "STK1"),
            ("threshold", "10.0"),
            ("price", "5.0"),
            ("status", "OFF"),
        ]),
        row(&[
            ("symbol", "STK1"),
            ("threshold", "10.0"),
            ("price", "11.0"),
            ("status", "ON"),
        ]),
    ]
}

pub(crate) fn begin_suite(name: &str, path: Option<&str>) -> LifecycleEvent {
    LifecycleEvent::BeginSuite {
        name: name.to_owned(),
        path: path.map(str::to_owned),
        nested: false,
        meta: Default::default(),
        description: None,
    }
}

pub(crate) fn begin_scenario(title: &str) -> LifecycleEvent {
    LifecycleEvent::BeginScenario {
        title: title.to_owned(),
        meta: Default::default(),
    }
}

pub(crate) fn begin_step(step: &str) -> LifecycleEvent {
    LifecycleEvent::BeginStep {
        step: step.to_owned(),
    }
}

pub(crate) fn step_successful(step: &str) -> LifecycleEvent {
    LifecycleEvent::StepSuccessful {
        step: step.to_owned(),
    }
}

/// A story running the stock-alert scenario over two example rows, with every step passing.
pub(crate) fn stock_alert_events() -> Vec<LifecycleEvent> {
    let mut events = vec![
        begin_suite("Examples", Some(EXAMPLES_STORY)),
        begin_scenario(STOCK_SCENARIO),
        LifecycleEvent::BeginExamples {
            steps: STOCK_STEPS.iter().map(|step| (*step).to_owned()).collect(),
            table: ExamplesTable::new(stock_rows()),
        },
    ];
    for (index, row) in stock_rows().into_iter().enumerate() {
        events.push(LifecycleEvent::ExampleRow { row, index });
        for step in STOCK_STEPS {
            events.push(begin_step(step));
            events.push(step_successful(step));
        }
    }
    events.extend([
        LifecycleEvent::EndExamples,
        LifecycleEvent::EndScenario,
        LifecycleEvent::EndSuite,
    ]);
    events
}

/// The definition of the stock-alert scenario, as reported when it is filtered out.
pub(crate) fn stock_alert_definition() -> ScenarioDefinition {
    ScenarioDefinition {
        title: STOCK_SCENARIO.to_owned(),
        meta: Default::default(),
        steps: STOCK_STEPS.iter().map(|step| (*step).to_owned()).collect(),
        examples: Some(ExamplesTable::new(stock_rows())),
    }
}

pub(crate) fn handle(port: &RecordingPort, name: &str) -> ItemHandle {
    port.find_by_name(name)
        .unwrap_or_else(|| panic!("item `{name}` was created"))
}

pub(crate) fn status(port: &RecordingPort, name: &str) -> Option<ItemStatus> {
    port.final_status(handle(port, name))
        .unwrap_or_else(|| panic!("item `{name}` was closed"))
}
