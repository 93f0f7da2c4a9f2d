// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The execution-tree mapper.
//!
//! The mapper is made up of, leaf-first:
//!
//! * [`identity`]: stable node identities and path-style code references.
//! * [`params`]: `<placeholder>` substitution from example rows, and test case IDs.
//! * [`status`]: the outcome fold, where `Failed` beats `Passed`, which beats `Skipped`.
//! * [`tree`]: the in-memory execution tree, which memoizes every item created in the backend.
//! * [`TreeMapper`]: the state machine that turns lifecycle events into item calls.
//!
//! All calls into the reporting backend go through the [`ItemPort`] trait.

pub mod identity;
mod machine;
pub mod params;
mod port;
pub mod status;
pub mod tree;

pub use machine::*;
pub use port::*;
