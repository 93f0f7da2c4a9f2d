// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node identities and code references.

use std::{collections::BTreeMap, fmt};
use storyport_metadata::{ExampleRow, ItemType};

/// Whether a lifecycle hook belongs to a story or to a scenario.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookScope {
    /// A story-level hook, including before-all and after-all stories.
    Story,
    /// A scenario-level hook, including hooks that run around example rows.
    Scenario,
}

/// The kind of a node in the execution tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// A story. Nested ("given") stories are also of this kind.
    Story,
    /// A scenario.
    Scenario,
    /// One row of an examples table.
    Example,
    /// A step.
    Step,
    /// A synthetic node for a hook that ran before a story or a scenario.
    BeforeHook(HookScope),
    /// A synthetic node for a hook that ran after a story or a scenario.
    AfterHook(HookScope),
}

impl NodeKind {
    /// Returns the tag used for this kind in code references.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Story => "STORY",
            Self::Scenario => "SCENARIO",
            Self::Example => "EXAMPLE",
            Self::Step => "STEP",
            Self::BeforeHook(_) => "BEFORE",
            Self::AfterHook(_) => "AFTER",
        }
    }

    /// Returns the item type this kind is reported as.
    pub fn item_type(self) -> ItemType {
        match self {
            Self::Story => ItemType::Story,
            Self::Scenario => ItemType::Scenario,
            Self::Example => ItemType::Test,
            Self::Step => ItemType::Step,
            Self::BeforeHook(HookScope::Story) => ItemType::BeforeSuite,
            Self::BeforeHook(HookScope::Scenario) => ItemType::BeforeTest,
            Self::AfterHook(HookScope::Story) => ItemType::AfterSuite,
            Self::AfterHook(HookScope::Scenario) => ItemType::AfterTest,
        }
    }

    /// Returns true if this kind is a synthetic hook.
    pub fn is_hook(self) -> bool {
        matches!(self, Self::BeforeHook(_) | Self::AfterHook(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The identity of a node among its siblings.
///
/// Two lookups with the same identity under the same parent resolve to the same node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeIdentity {
    /// A story, scenario, step or hook, identified by its kind and raw name.
    Named {
        /// The kind of node.
        kind: NodeKind,
        /// The raw name, before parameter substitution.
        name: String,
    },

    /// An example row, identified by its full contents regardless of column order.
    Row(BTreeMap<String, String>),
}

impl NodeIdentity {
    /// Creates an identity for a named node.
    pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
        Self::Named {
            kind,
            name: name.into(),
        }
    }

    /// Creates an identity for an example row.
    pub fn row(row: &ExampleRow) -> Self {
        Self::Row(
            row.iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Builds the code reference for a node.
///
/// A node without a parent reference (a top-level story) uses its name verbatim. Any other node
/// appends `/[TAG:name]` to its parent's reference, with line breaks removed from the name.
pub fn build_reference(parent: Option<&str>, kind: NodeKind, name: &str) -> String {
    match parent {
        None | Some("") => name.to_owned(),
        Some(parent) => {
            let mut reference = String::with_capacity(parent.len() + name.len() + 16);
            reference.push_str(parent);
            reference.push_str("/[");
            reference.push_str(kind.tag());
            reference.push(':');
            reference.extend(name.chars().filter(|&c| c != '\r' && c != '\n'));
            reference.push(']');
            reference
        }
    }
}
