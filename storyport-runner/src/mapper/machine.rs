// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event state machine.
//!
//! [`TreeMapper`] consumes lifecycle events one at a time and keeps a stack of frames mirroring
//! the current nesting path: a story, optionally a scenario, optionally an example row, and at
//! the top either a step or a synthetic hook. Each frame points at a node in the
//! [`ExecutionTree`]; frames are closed (and their outcomes folded) as later events move the
//! path elsewhere.

use super::{
    identity::{HookScope, NodeIdentity, NodeKind},
    params::{expand, format_row_name, row_reference_name},
    port::ItemPort,
    status::Outcome,
    tree::{ExecutionTree, NodeId, NodeSpec},
};
use crate::{
    config::StoryportConfig,
    errors::MapperError,
    helpers::{join_description, join_meta, meta_attributes, merge_meta},
};
use storyport_metadata::{
    ExampleRow, ExamplesTable, FailureCause, Issue, LifecycleEvent, LogLevel, Meta, Parameter,
    ScenarioDefinition,
};
use tracing::{debug, warn};

/// The reserved name of the story that runs before all other stories.
pub const BEFORE_STORIES: &str = "BeforeStories";
/// The reserved name of the story that runs after all other stories.
pub const AFTER_STORIES: &str = "AfterStories";

const BEFORE_STORY: &str = "BeforeStory";
const AFTER_STORY: &str = "AfterStory";
const BEFORE_SCENARIO: &str = "BeforeScenario";
const AFTER_SCENARIO: &str = "AfterScenario";

/// Settings that control how nodes are reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapperSettings {
    /// If false, skipped items are finished with the `NOT_ISSUE` marker.
    pub skipped_issue: bool,

    /// Item names longer than this many characters are truncated.
    pub max_name_length: usize,
}

impl MapperSettings {
    /// Reads mapper settings from the storyport configuration.
    pub fn from_config(config: &StoryportConfig) -> Self {
        Self {
            skipped_issue: config.launch().skipped_issue,
            max_name_length: config.items().max_name_length,
        }
    }
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self::from_config(&StoryportConfig::default_config())
    }
}

/// Information about a story that is about to run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteInfo {
    name: String,
    path: Option<String>,
    nested: bool,
    meta: Meta,
    description: Option<String>,
}

impl SuiteInfo {
    /// Creates a new top-level story with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the entry identifier (typically the story file path), used as the code reference.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Marks this story as nested within the current scenario or story.
    pub fn nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }

    /// Sets the story's meta properties.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the story description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SuitePhase {
    BeforeAll,
    AfterAll,
    Regular,
}

impl SuitePhase {
    fn from_name(name: &str) -> Self {
        match name {
            BEFORE_STORIES => Self::BeforeAll,
            AFTER_STORIES => Self::AfterAll,
            _ => Self::Regular,
        }
    }
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    state: FrameState,
}

#[derive(Debug)]
enum FrameState {
    Suite {
        phase: SuitePhase,
        meta: Meta,
        saw_scenario: bool,
    },
    Scenario {
        examples: Option<ExamplesTable>,
        saw_step: bool,
    },
    Example {
        row: ExampleRow,
        saw_step: bool,
    },
    Hook {
        kind: NodeKind,
    },
    Step {
        name: String,
    },
}

impl FrameState {
    fn is_suite(&self) -> bool {
        matches!(self, Self::Suite { .. })
    }

    fn is_scenario(&self) -> bool {
        matches!(self, Self::Scenario { .. })
    }

    fn is_dangling(&self) -> bool {
        matches!(self, Self::Hook { .. } | Self::Step { .. })
    }

    /// The hook that a failure outside any step belongs to, if this frame is a container.
    fn hook(&self) -> Option<(NodeKind, &'static str)> {
        let hook = match self {
            Self::Suite { phase, saw_scenario, .. } => match phase {
                SuitePhase::BeforeAll => (NodeKind::BeforeHook(HookScope::Story), BEFORE_STORIES),
                SuitePhase::AfterAll => (NodeKind::AfterHook(HookScope::Story), AFTER_STORIES),
                SuitePhase::Regular if *saw_scenario => {
                    (NodeKind::AfterHook(HookScope::Story), AFTER_STORY)
                }
                SuitePhase::Regular => (NodeKind::BeforeHook(HookScope::Story), BEFORE_STORY),
            },
            Self::Scenario { saw_step, .. } | Self::Example { saw_step, .. } => {
                if *saw_step {
                    (NodeKind::AfterHook(HookScope::Scenario), AFTER_SCENARIO)
                } else {
                    (NodeKind::BeforeHook(HookScope::Scenario), BEFORE_SCENARIO)
                }
            }
            Self::Hook { .. } | Self::Step { .. } => return None,
        };
        Some(hook)
    }
}

/// Maps lifecycle events onto items in a reporting backend.
///
/// The mapper is driven by a single caller, one event at a time. Every call into the backend
/// goes through the [`ItemPort`] passed in at construction.
#[derive(Debug)]
pub struct TreeMapper<P> {
    port: P,
    tree: ExecutionTree,
    settings: MapperSettings,
    stack: Vec<Frame>,
}

impl<P: ItemPort> TreeMapper<P> {
    /// Creates a new mapper that reports through `port`.
    pub fn new(port: P, settings: MapperSettings) -> Self {
        Self {
            port,
            tree: ExecutionTree::new(settings.max_name_length),
            settings,
            stack: Vec::new(),
        }
    }

    /// Returns the execution tree built so far.
    pub fn tree(&self) -> &ExecutionTree {
        &self.tree
    }

    /// Returns the port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Returns true if no story is in progress.
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// Dispatches a lifecycle event to the corresponding transition.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> Result<(), MapperError> {
        match event {
            LifecycleEvent::BeginSuite {
                name,
                path,
                nested,
                meta,
                description,
            } => {
                self.begin_suite(SuiteInfo {
                    name,
                    path,
                    nested,
                    meta,
                    description,
                });
                Ok(())
            }
            LifecycleEvent::EndSuite => {
                self.end_suite();
                Ok(())
            }
            LifecycleEvent::SuiteCancelled => {
                self.suite_cancelled();
                Ok(())
            }
            LifecycleEvent::BeginScenario { title, meta } => self.begin_scenario(&title, &meta),
            LifecycleEvent::EndScenario => {
                self.end_scenario();
                Ok(())
            }
            LifecycleEvent::BeginExamples { steps, table } => {
                self.begin_examples(&steps, table);
                Ok(())
            }
            LifecycleEvent::ExampleRow { row, index } => self.example_row(row, index),
            LifecycleEvent::EndExamples => {
                self.end_examples();
                Ok(())
            }
            LifecycleEvent::BeginStep { step } => self.begin_step(&step),
            LifecycleEvent::StepSuccessful { step } => {
                self.step_successful(&step);
                Ok(())
            }
            LifecycleEvent::StepFailed { step, cause } => self.step_failed(&step, &cause),
            LifecycleEvent::StepIgnorable { step } => self.step_ignorable(&step),
            LifecycleEvent::StepNotPerformed { step } => self.step_not_performed(&step),
            LifecycleEvent::StepPending { step } => self.step_pending(&step),
            LifecycleEvent::ScenarioNotAllowed { scenario, filter } => {
                self.scenario_not_allowed(scenario, &filter)
            }
        }
    }

    /// A story started.
    ///
    /// A nested story is attached to the open scenario, or to the current story if no scenario
    /// is open. A top-level story that arrives while frames are still open closes them first.
    pub fn begin_suite(&mut self, suite: SuiteInfo) {
        let SuiteInfo {
            name,
            path,
            nested,
            meta,
            description,
        } = suite;

        let parent = if nested {
            match self.innermost_suite() {
                Some(suite_idx) => {
                    self.unwind_dangling();
                    let parent_idx = self
                        .innermost_in_suite(FrameState::is_scenario)
                        .unwrap_or(suite_idx);
                    Some(self.stack[parent_idx].node)
                }
                None => {
                    debug!(
                        %name,
                        "nested story without an enclosing story, reporting it at the top level"
                    );
                    None
                }
            }
        } else {
            if !self.stack.is_empty() {
                warn!(
                    %name,
                    open = self.stack.len(),
                    "story started while another story was still open, closing it",
                );
                self.close_frames_from(0, None);
            }
            None
        };

        let identity = NodeIdentity::named(NodeKind::Story, path.as_deref().unwrap_or(&name));
        let node = self.tree.fetch_or_create(&mut self.port, parent, identity, || {
            let description = join_description([
                description.as_deref().unwrap_or_default(),
                join_meta([&meta]).as_str(),
            ]);
            let spec = NodeSpec::new(NodeKind::Story, name.as_str())
                .with_attributes(meta_attributes(&meta))
                .with_description(description);
            match &path {
                Some(path) => spec.with_reference_name(path.as_str()),
                None => spec,
            }
        });

        self.stack.push(Frame {
            node,
            state: FrameState::Suite {
                phase: SuitePhase::from_name(&name),
                meta,
                saw_scenario: false,
            },
        });
    }

    /// The current story finished.
    pub fn end_suite(&mut self) {
        let Some(suite_idx) = self.innermost_suite() else {
            debug!("end-suite without an open story, ignoring");
            return;
        };
        self.close_frames_from(suite_idx, None);
    }

    /// The current story was cancelled.
    ///
    /// Every open frame down to and including the story is closed as skipped, without folding.
    pub fn suite_cancelled(&mut self) {
        let Some(suite_idx) = self.innermost_suite() else {
            debug!("suite-cancelled without an open story, ignoring");
            return;
        };
        self.close_frames_from(suite_idx, Some(Outcome::Skipped));
    }

    /// A scenario started.
    pub fn begin_scenario(&mut self, title: &str, meta: &Meta) -> Result<(), MapperError> {
        let suite_idx = self.innermost_suite().ok_or(MapperError::NoOpenSuite {
            event: "begin-scenario",
        })?;
        self.close_frames_from(suite_idx + 1, None);

        let suite = &mut self.stack[suite_idx];
        let story_meta = match &mut suite.state {
            FrameState::Suite {
                meta, saw_scenario, ..
            } => {
                *saw_scenario = true;
                meta.clone()
            }
            _ => Meta::new(),
        };
        let parent = suite.node;

        let name = expand(title, &merge_meta([&story_meta, meta])).text;
        let node = self.tree.fetch_or_create(
            &mut self.port,
            Some(parent),
            NodeIdentity::named(NodeKind::Scenario, name.as_str()),
            || {
                NodeSpec::new(NodeKind::Scenario, name)
                    .with_attributes(meta_attributes(meta))
                    .with_description(join_description([join_meta([&story_meta, meta]).as_str()]))
            },
        );

        self.stack.push(Frame {
            node,
            state: FrameState::Scenario {
                examples: None,
                saw_step: false,
            },
        });
        Ok(())
    }

    /// The current scenario finished.
    pub fn end_scenario(&mut self) {
        let Some(scenario_idx) = self.innermost_in_suite(FrameState::is_scenario) else {
            debug!("end-scenario without an open scenario, ignoring");
            return;
        };
        self.close_frames_from(scenario_idx, None);
    }

    /// An examples table is about to be iterated for the current scenario.
    ///
    /// This opens no node.
    pub fn begin_examples(&mut self, steps: &[String], table: ExamplesTable) {
        let Some(scenario_idx) = self.innermost_in_suite(FrameState::is_scenario) else {
            debug!("begin-examples without an open scenario, ignoring");
            return;
        };
        debug!(
            steps = steps.len(),
            rows = table.row_count(),
            "armed examples table"
        );
        if let FrameState::Scenario { examples, .. } = &mut self.stack[scenario_idx].state {
            *examples = Some(table);
        }
    }

    /// The next row of the examples table is about to run.
    pub fn example_row(&mut self, row: ExampleRow, index: usize) -> Result<(), MapperError> {
        let suite_idx = self.innermost_suite().ok_or(MapperError::NoOpenSuite {
            event: "example-row",
        })?;
        let container_idx = self
            .innermost_in_suite(FrameState::is_scenario)
            .unwrap_or(suite_idx);
        self.close_frames_from(container_idx + 1, None);

        let container = &self.stack[container_idx];
        if !matches!(
            container.state,
            FrameState::Scenario {
                examples: Some(_),
                ..
            }
        ) {
            debug!(index, "example row without an examples table");
        }

        let parent = container.node;
        let node = self.tree.fetch_or_create(
            &mut self.port,
            Some(parent),
            NodeIdentity::row(&row),
            || {
                NodeSpec::new(NodeKind::Example, format_row_name(&row))
                    .with_reference_name(row_reference_name(&row))
                    .with_parameters(
                        row.iter()
                            .map(|(key, value)| Parameter::new(key.as_str(), value.as_str()))
                            .collect(),
                    )
            },
        );

        self.stack.push(Frame {
            node,
            state: FrameState::Example {
                row,
                saw_step: false,
            },
        });
        Ok(())
    }

    /// All rows of the examples table have run.
    pub fn end_examples(&mut self) {
        let Some(scenario_idx) = self.innermost_in_suite(FrameState::is_scenario) else {
            debug!("end-examples without an open scenario, ignoring");
            return;
        };
        self.close_frames_from(scenario_idx + 1, None);
        if let FrameState::Scenario { examples, .. } = &mut self.stack[scenario_idx].state {
            *examples = None;
        }
    }

    /// A step is about to run.
    pub fn begin_step(&mut self, step: &str) -> Result<(), MapperError> {
        self.open_step(step, "begin-step").map(|_| ())
    }

    /// The open step passed.
    pub fn step_successful(&mut self, step: &str) {
        match self.pop_step() {
            Some(node) => {
                self.close_node(node, Outcome::Passed);
            }
            None => debug!(step, "step-successful without an open step, ignoring"),
        }
    }

    /// A step failed.
    ///
    /// If no step is open, the failure came from a lifecycle hook. A synthetic hook node is
    /// opened for it (or reused, if the same hook already failed), and the failing item is
    /// reported as a step under that hook.
    pub fn step_failed(&mut self, step: &str, cause: &FailureCause) -> Result<(), MapperError> {
        if let Some(node) = self.pop_step() {
            self.tree
                .emit_log(&mut self.port, node, LogLevel::Error, cause.to_string());
            self.close_node(node, Outcome::Failed);
            return Ok(());
        }

        if self.innermost_suite().is_none() {
            return Err(MapperError::NoOpenSuite {
                event: "step-failed",
            });
        }
        let hook = self.open_hook();
        let node = self.tree.fetch_or_create(
            &mut self.port,
            Some(hook),
            NodeIdentity::named(NodeKind::Step, step),
            || NodeSpec::new(NodeKind::Step, step),
        );
        self.tree
            .emit_log(&mut self.port, node, LogLevel::Error, cause.to_string());
        self.close_node(node, Outcome::Failed);
        Ok(())
    }

    /// A step was ignorable.
    pub fn step_ignorable(&mut self, step: &str) -> Result<(), MapperError> {
        self.skip_step(step, "step-ignorable", None)
    }

    /// A step was not performed because an earlier step failed.
    pub fn step_not_performed(&mut self, step: &str) -> Result<(), MapperError> {
        self.skip_step(
            step,
            "step-not-performed",
            Some("Step was not performed because a previous step failed".to_owned()),
        )
    }

    /// No implementation could be found for a step.
    pub fn step_pending(&mut self, step: &str) -> Result<(), MapperError> {
        self.skip_step(
            step,
            "step-pending",
            Some(format!("Unable to locate a step implementation for: {step}")),
        )
    }

    /// A scenario was excluded from the run by a filter.
    ///
    /// The scenario is opened if it isn't already, and every step is reported as skipped, once
    /// per example row if the scenario has an examples table.
    pub fn scenario_not_allowed(
        &mut self,
        scenario: ScenarioDefinition,
        filter: &str,
    ) -> Result<(), MapperError> {
        const EVENT: &str = "scenario-not-allowed";

        let ScenarioDefinition {
            title,
            meta,
            steps,
            examples,
        } = scenario;

        if self.innermost_suite().is_none() {
            return Err(MapperError::NoOpenSuite { event: EVENT });
        }
        let scenario_idx = match self.innermost_in_suite(FrameState::is_scenario) {
            Some(idx) => {
                self.close_frames_from(idx + 1, None);
                idx
            }
            None => {
                self.begin_scenario(&title, &meta)?;
                self.stack.len() - 1
            }
        };

        let scenario_node = self.stack[scenario_idx].node;
        self.tree.emit_log(
            &mut self.port,
            scenario_node,
            LogLevel::Info,
            format!("Scenario was not allowed by filter: {filter}"),
        );

        match examples.filter(|table| !table.is_empty()) {
            Some(table) => {
                self.begin_examples(&steps, table.clone());
                for (index, row) in table.rows.into_iter().enumerate() {
                    self.example_row(row, index)?;
                    let row_idx = self.stack.len() - 1;
                    for step in &steps {
                        self.simulate_skipped(step, EVENT)?;
                    }
                    self.close_frames_from(row_idx, Some(Outcome::Skipped));
                }
                self.end_examples();
            }
            None => {
                for step in &steps {
                    self.simulate_skipped(step, EVENT)?;
                }
            }
        }

        self.close_frames_from(scenario_idx, Some(Outcome::Skipped));
        Ok(())
    }

    /// Finishes the run, closing any items that are still open as failed.
    ///
    /// Returns the port and the final execution tree.
    pub fn finish(mut self) -> (P, ExecutionTree) {
        self.stack.clear();
        let open = self.tree.open_nodes();
        if !open.is_empty() {
            warn!(
                count = open.len(),
                "items were still open at the end of the run, finishing them as failed",
            );
            for node in open {
                self.tree.close(&mut self.port, node, Outcome::Failed, None);
            }
        }
        (self.port, self.tree)
    }

    // ---
    // Helper methods
    // ---

    fn innermost_suite(&self) -> Option<usize> {
        self.stack.iter().rposition(|frame| frame.state.is_suite())
    }

    /// Returns the innermost frame matching `pred` that is above the innermost suite.
    fn innermost_in_suite(&self, pred: impl Fn(&FrameState) -> bool) -> Option<usize> {
        for (idx, frame) in self.stack.iter().enumerate().rev() {
            if pred(&frame.state) {
                return Some(idx);
            }
            if frame.state.is_suite() {
                return None;
            }
        }
        None
    }

    /// Closes and pops every frame from `idx` upwards, innermost first.
    ///
    /// With `forced`, each frame is closed with that outcome. Otherwise each frame's outcome is
    /// folded from its children.
    fn close_frames_from(&mut self, idx: usize, forced: Option<Outcome>) {
        let idx = idx.min(self.stack.len());
        for frame in self.stack.split_off(idx).into_iter().rev() {
            let outcome = forced.unwrap_or_else(|| self.tree.fold(frame.node));
            self.close_node(frame.node, outcome);
        }
    }

    /// Closes hook and step frames left open on top of the stack.
    fn unwind_dangling(&mut self) {
        let keep = self
            .stack
            .iter()
            .rposition(|frame| !frame.state.is_dangling())
            .map_or(0, |idx| idx + 1);
        self.close_frames_from(keep, None);
    }

    fn close_node(&mut self, node: NodeId, outcome: Outcome) -> bool {
        let issue = (outcome == Outcome::Skipped && !self.settings.skipped_issue)
            .then(Issue::not_issue);
        self.tree.close(&mut self.port, node, outcome, issue)
    }

    /// Opens a step node under the innermost container and pushes a step frame for it.
    fn open_step(&mut self, step: &str, event: &'static str) -> Result<NodeId, MapperError> {
        if self.innermost_suite().is_none() {
            return Err(MapperError::NoOpenSuite { event });
        }
        self.unwind_dangling();

        let Some(container) = self.stack.last() else {
            return Err(MapperError::NoOpenSuite { event });
        };
        let parent = container.node;
        let (text, parameters) = match &container.state {
            FrameState::Example { row, .. } => {
                let expanded = expand(step, row);
                (expanded.text, expanded.parameters)
            }
            _ => (step.to_owned(), Vec::new()),
        };
        self.mark_step_seen();

        let node = self.tree.fetch_or_create(
            &mut self.port,
            Some(parent),
            NodeIdentity::named(NodeKind::Step, step),
            || {
                NodeSpec::new(NodeKind::Step, text)
                    .with_reference_name(step)
                    .with_parameters(parameters)
            },
        );
        self.stack.push(Frame {
            node,
            state: FrameState::Step {
                name: step.to_owned(),
            },
        });
        Ok(node)
    }

    /// Pops the open step frame, if the top of the stack is one.
    fn pop_step(&mut self) -> Option<NodeId> {
        match self.stack.last() {
            Some(Frame {
                state: FrameState::Step { .. },
                ..
            }) => self.stack.pop().map(|frame| frame.node),
            _ => None,
        }
    }

    /// Closes a step as skipped, opening it first if it isn't the open step.
    fn skip_step(
        &mut self,
        step: &str,
        event: &'static str,
        warning: Option<String>,
    ) -> Result<(), MapperError> {
        let is_open = matches!(
            self.stack.last(),
            Some(Frame { state: FrameState::Step { name }, .. }) if name == step
        );
        if !is_open {
            self.open_step(step, event)?;
        }
        if let Some(node) = self.pop_step() {
            if let Some(message) = warning {
                self.tree
                    .emit_log(&mut self.port, node, LogLevel::Warn, message);
            }
            self.close_node(node, Outcome::Skipped);
        }
        Ok(())
    }

    fn simulate_skipped(&mut self, step: &str, event: &'static str) -> Result<(), MapperError> {
        self.open_step(step, event)?;
        if let Some(node) = self.pop_step() {
            self.close_node(node, Outcome::Skipped);
        }
        Ok(())
    }

    /// Records that a step ran in every scenario and example row of the current story.
    fn mark_step_seen(&mut self) {
        for frame in self.stack.iter_mut().rev() {
            match &mut frame.state {
                FrameState::Scenario { saw_step, .. } | FrameState::Example { saw_step, .. } => {
                    *saw_step = true;
                }
                FrameState::Suite { .. } => break,
                FrameState::Hook { .. } | FrameState::Step { .. } => {}
            }
        }
    }

    /// Returns the hook node that a failure outside any step belongs to, opening it if needed.
    ///
    /// Must be called with a story open.
    fn open_hook(&mut self) -> NodeId {
        let container_idx = self
            .stack
            .iter()
            .rposition(|frame| !frame.state.is_dangling())
            .unwrap_or_default();
        let container = &self.stack[container_idx];
        let parent = container.node;
        let (kind, name) = container
            .state
            .hook()
            .unwrap_or((NodeKind::BeforeHook(HookScope::Story), BEFORE_STORY));

        if let Some(Frame {
            node,
            state: FrameState::Hook { kind: open_kind },
        }) = self.stack.get(container_idx + 1)
            && *open_kind == kind
        {
            let node = *node;
            self.close_frames_from(container_idx + 2, None);
            return node;
        }

        self.close_frames_from(container_idx + 1, None);
        let node = self.tree.fetch_or_create(
            &mut self.port,
            Some(parent),
            NodeIdentity::named(kind, name),
            || NodeSpec::new(kind, name),
        );
        debug!(%kind, name, "opened hook for a failure outside any step");
        self.stack.push(Frame {
            node,
            state: FrameState::Hook { kind },
        });
        node
    }
}
