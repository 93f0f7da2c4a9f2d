// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `storyport` failures.
///
/// `storyport` invocations may fail for a variety of reasons. This structure documents the exit
/// codes that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum StoryportExitCode {}

impl StoryportExitCode {
    /// No errors occurred and storyport exited normally.
    pub const OK: i32 = 0;

    /// The replayed run finished, and at least one story in it failed.
    pub const RUN_FAILED: i32 = 100;

    /// The event stream could not be read or parsed.
    pub const EVENT_READ_FAILED: i32 = 101;

    /// The event stream was structurally inconsistent (for example, a scenario event arrived
    /// while no story was open).
    pub const EVENT_SEQUENCE_INVALID: i32 = 102;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a storyport invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// The configuration file could not be parsed.
    pub const INVALID_CONFIG: i32 = 95;
}
