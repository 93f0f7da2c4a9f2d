// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for storyport-runner.
//!
//! Each test drives a full launch session through the recording port, and checks the item calls
//! that a reporting backend would have seen.

mod basic;
mod fixtures;
mod hooks;
mod settings;
