// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for storyport.
//!
//! Storyport observes a story run (stories, scenarios, example tables, steps and lifecycle
//! hooks) as an ordered stream of lifecycle events, and mirrors it node-for-node as a tree of
//! items in a reporting backend.
//!
//! The main types are:
//!
//! * [`mapper::TreeMapper`], the state machine that turns lifecycle events into item calls.
//! * [`mapper::ItemPort`], the capability interface to the reporting backend.
//! * [`launch::LaunchSession`], which owns the launch lifecycle around a mapper.
//! * [`reporter::RecordingPort`], an in-memory backend used for dry runs and tests.

pub mod config;
pub mod errors;
mod helpers;
pub mod launch;
pub mod mapper;
pub mod replay;
pub mod reporter;
