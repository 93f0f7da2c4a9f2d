// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mirror story runs as item trees in a reporting backend.
//!
//! The `storyport` binary replays recorded lifecycle events through the storyport mapper, and
//! shows the item tree a reporting backend would have received.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
