// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Meta properties attached to a story or scenario, in declaration order.
///
/// Properties declared without a value (e.g. `@smoke`) map to an empty string.
pub type Meta = IndexMap<String, String>;

/// One row of an examples table: column name to cell value, in column order.
pub type ExampleRow = IndexMap<String, String>;

/// A lifecycle event emitted by a story-execution engine.
///
/// Events arrive strictly in order, one at a time. In JSON, each event is an object with an
/// `event` tag, for example:
///
/// ```json
/// {"event": "begin-step", "step": "Given I have empty step"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LifecycleEvent {
    /// A story (suite) started.
    #[serde(rename_all = "kebab-case")]
    BeginSuite {
        /// The story name.
        name: String,

        /// The entry identifier for the story, typically its file path.
        ///
        /// Used as the story's code reference when present.
        #[serde(default)]
        path: Option<String>,

        /// True if this story is invoked from within another story (a "given story").
        #[serde(default)]
        nested: bool,

        /// Story-level meta properties.
        #[serde(default)]
        meta: Meta,

        /// The story description, if any.
        #[serde(default)]
        description: Option<String>,
    },

    /// The current story finished.
    EndSuite,

    /// The current story was cancelled, for example because it timed out.
    SuiteCancelled,

    /// A scenario started.
    #[serde(rename_all = "kebab-case")]
    BeginScenario {
        /// The scenario title.
        title: String,

        /// Scenario-level meta properties.
        #[serde(default)]
        meta: Meta,
    },

    /// The current scenario finished.
    EndScenario,

    /// An examples table is about to be iterated for the current scenario.
    #[serde(rename_all = "kebab-case")]
    BeginExamples {
        /// The step templates that will be run for each row.
        #[serde(default)]
        steps: Vec<String>,

        /// The examples table.
        table: ExamplesTable,
    },

    /// The next row of the examples table is about to run.
    #[serde(rename_all = "kebab-case")]
    ExampleRow {
        /// The row being run.
        row: ExampleRow,

        /// The zero-based index of the row in the table.
        #[serde(default)]
        index: usize,
    },

    /// All rows of the examples table have run.
    EndExamples,

    /// A step is about to run.
    BeginStep {
        /// The raw step text, with placeholders unsubstituted.
        step: String,
    },

    /// A step passed.
    StepSuccessful {
        /// The raw step text.
        step: String,
    },

    /// A step, or a lifecycle hook outside any step, failed.
    StepFailed {
        /// The raw step text, or the hook's description if the failure came from a hook.
        step: String,

        /// What caused the failure.
        cause: FailureCause,
    },

    /// A step was ignorable (for example, a commented-out step).
    StepIgnorable {
        /// The raw step text.
        step: String,
    },

    /// A step was not performed because an earlier step failed.
    StepNotPerformed {
        /// The raw step text.
        step: String,
    },

    /// No implementation could be found for a step.
    StepPending {
        /// The raw step text.
        step: String,
    },

    /// A scenario was excluded from the run by a filter.
    ScenarioNotAllowed {
        /// The scenario that was excluded.
        scenario: ScenarioDefinition,

        /// The filter that excluded it.
        filter: String,
    },
}

impl LifecycleEvent {
    /// Returns the kebab-case name of this event, as used in the `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginSuite { .. } => "begin-suite",
            Self::EndSuite => "end-suite",
            Self::SuiteCancelled => "suite-cancelled",
            Self::BeginScenario { .. } => "begin-scenario",
            Self::EndScenario => "end-scenario",
            Self::BeginExamples { .. } => "begin-examples",
            Self::ExampleRow { .. } => "example-row",
            Self::EndExamples => "end-examples",
            Self::BeginStep { .. } => "begin-step",
            Self::StepSuccessful { .. } => "step-successful",
            Self::StepFailed { .. } => "step-failed",
            Self::StepIgnorable { .. } => "step-ignorable",
            Self::StepNotPerformed { .. } => "step-not-performed",
            Self::StepPending { .. } => "step-pending",
            Self::ScenarioNotAllowed { .. } => "scenario-not-allowed",
        }
    }
}

/// An examples table attached to a scenario.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplesTable {
    /// The rows of the table, in order.
    #[serde(default)]
    pub rows: Vec<ExampleRow>,
}

impl ExamplesTable {
    /// Creates a new table from the given rows.
    pub fn new(rows: impl IntoIterator<Item = ExampleRow>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    /// Returns the number of rows in this table.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The static definition of a scenario, as reported when the scenario is filtered out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// The scenario title.
    pub title: String,

    /// Scenario-level meta properties.
    #[serde(default)]
    pub meta: Meta,

    /// The raw step texts of the scenario.
    #[serde(default)]
    pub steps: Vec<String>,

    /// The examples table, if the scenario is data-driven.
    #[serde(default)]
    pub examples: Option<ExamplesTable>,
}

/// The cause of a step or hook failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    /// A one-line summary of the failure.
    pub message: String,

    /// Additional detail, such as a backtrace.
    #[serde(default)]
    pub detail: Option<String>,
}

impl FailureCause {
    /// Creates a new failure cause with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    /// Sets the detail for this failure cause.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n{detail}")?;
        }
        Ok(())
    }
}
