// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The type of an item in the reporting backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    /// A story (top-level or nested suite).
    Story,
    /// A scenario within a story.
    Scenario,
    /// One row of an examples table.
    Test,
    /// A single step.
    Step,
    /// A hook that runs before a story or before all stories.
    BeforeSuite,
    /// A hook that runs after a story or after all stories.
    AfterSuite,
    /// A hook that runs before a scenario.
    BeforeTest,
    /// A hook that runs after a scenario.
    AfterTest,
}

impl ItemType {
    /// Returns the backend name for this item type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Story => "STORY",
            Self::Scenario => "SCENARIO",
            Self::Test => "TEST",
            Self::Step => "STEP",
            Self::BeforeSuite => "BEFORE_SUITE",
            Self::AfterSuite => "AFTER_SUITE",
            Self::BeforeTest => "BEFORE_TEST",
            Self::AfterTest => "AFTER_TEST",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final status of an item, as sent to the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// The item passed.
    Passed,
    /// The item failed.
    Failed,
    /// The item was skipped.
    Skipped,
}

impl ItemStatus {
    /// Returns the backend name for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The level of a log message attached to an item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// An error, such as a step failure.
    Error,
    /// A warning.
    Warn,
    /// Informational output.
    Info,
    /// Debug output.
    Debug,
    /// Trace output.
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        };
        f.write_str(s)
    }
}

/// A named parameter substituted into an item's name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// The placeholder name.
    pub key: String,
    /// The substituted value.
    pub value: String,
}

impl Parameter {
    /// Creates a new parameter.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Parameter {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// A free-form attribute attached to a launch or an item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute key, if any. Attributes without a key act as tags.
    #[serde(default)]
    pub key: Option<String>,

    /// The attribute value.
    pub value: String,

    /// System attributes are used by the backend and hidden from users.
    #[serde(default)]
    pub system: bool,
}

impl Attribute {
    /// Creates a new key-value attribute.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
            system: false,
        }
    }

    /// Creates a new attribute without a key.
    pub fn tag(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: value.into(),
            system: false,
        }
    }

    /// Marks this attribute as a system attribute.
    pub fn into_system(mut self) -> Self {
        self.system = true;
        self
    }
}

impl FromStr for Attribute {
    type Err = AttributeParseError;

    /// Parses `key:value` or `value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((key, value)) => {
                let (key, value) = (key.trim(), value.trim());
                if value.is_empty() {
                    return Err(AttributeParseError::new(s));
                }
                if key.is_empty() {
                    Ok(Self::tag(value))
                } else {
                    Ok(Self::new(key, value))
                }
            }
            None if s.is_empty() => Err(AttributeParseError::new(s)),
            None => Ok(Self::tag(s)),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{key}:{}", self.value),
            None => f.write_str(&self.value),
        }
    }
}

/// An error returned while parsing an [`Attribute`] from a string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid attribute `{input}`: expected `key:value` or `value` with a non-empty value")]
pub struct AttributeParseError {
    input: String,
}

impl AttributeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An issue marker attached to a finished item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// The issue type locator.
    pub issue_type: String,
}

impl Issue {
    /// The issue type for items that are not to be investigated.
    pub const NOT_ISSUE: &'static str = "NOT_ISSUE";

    /// Returns the "not an issue" marker.
    pub fn not_issue() -> Self {
        Self {
            issue_type: Self::NOT_ISSUE.to_owned(),
        }
    }
}

/// The run mode of a launch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchMode {
    /// A regular launch, visible to everyone.
    #[default]
    Default,
    /// A debug launch, visible only to its owner.
    Debug,
}

impl LaunchMode {
    /// Returns the configuration name for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to start a launch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartLaunchRequest {
    /// The launch name.
    pub name: String,
    /// The launch description.
    pub description: Option<String>,
    /// The launch mode.
    pub mode: LaunchMode,
    /// Attributes attached to the launch.
    pub attributes: Vec<Attribute>,
    /// The time at which the launch started.
    pub start_time: DateTime<FixedOffset>,
}

/// A request to create an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartItemRequest {
    /// The display name of the item.
    pub name: String,
    /// The item type.
    pub item_type: ItemType,
    /// The time at which the item started.
    pub start_time: DateTime<FixedOffset>,
    /// The path-style code reference for the item.
    pub code_ref: String,
    /// The cross-run test case identifier.
    pub test_case_id: Option<String>,
    /// Parameters substituted into the item name, in order.
    pub parameters: Vec<Parameter>,
    /// Free-form attributes.
    pub attributes: Vec<Attribute>,
    /// The item description.
    pub description: Option<String>,
}

/// A request to finish an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishItemRequest {
    /// The time at which the item finished.
    pub end_time: DateTime<FixedOffset>,
    /// The final status, or `None` to let the backend compute it from the item's children.
    pub status: Option<ItemStatus>,
    /// An issue marker, if any.
    pub issue: Option<Issue>,
}

/// A request to attach a log message to an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRequest {
    /// The log level.
    pub level: LogLevel,
    /// The message.
    pub message: String,
    /// The time at which the message was produced.
    pub time: DateTime<FixedOffset>,
}
