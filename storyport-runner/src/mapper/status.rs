// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outcome aggregation.

use std::fmt;
use storyport_metadata::ItemStatus;

/// The outcome of a node in the execution tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Outcome {
    /// No outcome has been recorded.
    #[default]
    Unset,
    /// The node passed.
    Passed,
    /// The node failed.
    Failed,
    /// The node was skipped.
    Skipped,
}

impl Outcome {
    /// Combines two outcomes.
    ///
    /// `Unset` is the identity. Otherwise the result is the higher-precedence outcome, where
    /// `Failed` beats `Passed`, which beats `Skipped`.
    pub fn combine(self, incoming: Self) -> Self {
        match (self, incoming) {
            (Self::Unset, other) | (other, Self::Unset) => other,
            (Self::Failed, _) | (_, Self::Failed) => Self::Failed,
            (Self::Passed, _) | (_, Self::Passed) => Self::Passed,
            (Self::Skipped, Self::Skipped) => Self::Skipped,
        }
    }

    /// Folds a node's own outcome with its children's outcomes, in order.
    pub fn fold(own: Self, children: impl IntoIterator<Item = Self>) -> Self {
        children.into_iter().fold(own, Self::combine)
    }

    /// Returns the status sent to the backend, or `None` if the outcome is unset.
    pub fn to_status(self) -> Option<ItemStatus> {
        match self {
            Self::Unset => None,
            Self::Passed => Some(ItemStatus::Passed),
            Self::Failed => Some(ItemStatus::Failed),
            Self::Skipped => Some(ItemStatus::Skipped),
        }
    }
}

impl From<ItemStatus> for Outcome {
    fn from(status: ItemStatus) -> Self {
        match status {
            ItemStatus::Passed => Self::Passed,
            ItemStatus::Failed => Self::Failed,
            ItemStatus::Skipped => Self::Skipped,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unset => "UNSET",
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}
