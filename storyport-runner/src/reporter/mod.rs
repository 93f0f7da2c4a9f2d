// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local reporting backends.
//!
//! [`RecordingPort`] records every item call in memory, and [`DisplayItemTree`] renders what it
//! recorded.

mod display;
mod recorder;

pub use display::*;
pub use recorder::*;
