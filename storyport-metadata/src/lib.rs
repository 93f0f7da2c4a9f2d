// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Serializable types shared between storyport and the tools around it.
//!
//! This crate defines two families of types:
//!
//! * **Lifecycle events** ([`LifecycleEvent`]) are emitted by a story-execution engine, one at a
//!   time, as a run proceeds. They can be recorded as JSON lines and replayed later.
//! * **Item requests** ([`StartItemRequest`], [`FinishItemRequest`], [`LogRequest`],
//!   [`StartLaunchRequest`]) are what storyport sends to a reporting backend.

mod events;
mod exit_codes;
mod items;

pub use events::*;
pub use exit_codes::*;
pub use items::*;
