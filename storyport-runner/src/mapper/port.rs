// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The interface between the mapper and a reporting backend.

use chrono::{DateTime, FixedOffset};
use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};
use serde::{Deserialize, Serialize};
use std::fmt;
use storyport_metadata::{FinishItemRequest, LogRequest, StartItemRequest, StartLaunchRequest};

/// Kind marker for item handles.
pub enum ItemKind {}

impl TypedUuidKind for ItemKind {
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("item");
        TAG
    }
}

/// Kind marker for launch handles.
pub enum LaunchKind {}

impl TypedUuidKind for LaunchKind {
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("launch");
        TAG
    }
}

/// An opaque reference to an item in the reporting backend.
///
/// Handles are minted by the backend when an item is created, and may refer to an item whose
/// creation hasn't completed yet. The mapper never inspects a handle: it only passes it back to
/// the port, for example as the parent of a new item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(TypedUuid<ItemKind>);

impl ItemHandle {
    /// Mints a new, random handle.
    pub fn new() -> Self {
        Self(TypedUuid::new_v4())
    }
}

impl Default for ItemHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An opaque reference to a launch in the reporting backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchHandle(TypedUuid<LaunchKind>);

impl LaunchHandle {
    /// Mints a new, random handle.
    pub fn new() -> Self {
        Self(TypedUuid::new_v4())
    }
}

impl Default for LaunchHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LaunchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A reporting backend, as seen by the mapper.
///
/// Every call returns immediately. Creating an item returns a handle that the backend resolves
/// on its own schedule; failures are the backend's concern and are never surfaced to the mapper.
pub trait ItemPort {
    /// Starts a launch that items are reported under.
    fn start_launch(&mut self, request: StartLaunchRequest) -> LaunchHandle;

    /// Finishes a launch.
    fn finish_launch(&mut self, launch: LaunchHandle, end_time: DateTime<FixedOffset>);

    /// Creates an item, as a child of `parent` or at the top level of the launch.
    fn create_item(&mut self, parent: Option<ItemHandle>, request: StartItemRequest)
    -> ItemHandle;

    /// Finishes an item.
    fn close_item(&mut self, item: ItemHandle, request: FinishItemRequest);

    /// Attaches a log message to an item.
    fn emit_log(&mut self, item: ItemHandle, request: LogRequest);
}

impl<P: ItemPort + ?Sized> ItemPort for &mut P {
    fn start_launch(&mut self, request: StartLaunchRequest) -> LaunchHandle {
        (**self).start_launch(request)
    }

    fn finish_launch(&mut self, launch: LaunchHandle, end_time: DateTime<FixedOffset>) {
        (**self).finish_launch(launch, end_time)
    }

    fn create_item(
        &mut self,
        parent: Option<ItemHandle>,
        request: StartItemRequest,
    ) -> ItemHandle {
        (**self).create_item(parent, request)
    }

    fn close_item(&mut self, item: ItemHandle, request: FinishItemRequest) {
        (**self).close_item(item, request)
    }

    fn emit_log(&mut self, item: ItemHandle, request: LogRequest) {
        (**self).emit_log(item, request)
    }
}
