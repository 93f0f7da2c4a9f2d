// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::WriteRecordError,
    mapper::{ItemHandle, ItemPort, LaunchHandle},
};
use camino::Utf8Path;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufWriter, Write},
};
use storyport_metadata::{
    FinishItemRequest, ItemStatus, LogRequest, StartItemRequest, StartLaunchRequest,
};

/// A single call made through an [`ItemPort`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "kebab-case")]
pub enum PortCall {
    /// A launch was started.
    StartLaunch {
        /// The handle minted for the launch.
        launch: LaunchHandle,
        /// The request.
        request: StartLaunchRequest,
    },

    /// A launch was finished.
    FinishLaunch {
        /// The launch that was finished.
        launch: LaunchHandle,
        /// The time at which the launch finished.
        end_time: DateTime<FixedOffset>,
    },

    /// An item was created.
    CreateItem {
        /// The handle minted for the item.
        item: ItemHandle,
        /// The parent item, or `None` for a top-level item.
        parent: Option<ItemHandle>,
        /// The request.
        request: StartItemRequest,
    },

    /// An item was closed.
    CloseItem {
        /// The item that was closed.
        item: ItemHandle,
        /// The request.
        request: FinishItemRequest,
    },

    /// A log message was attached to an item.
    EmitLog {
        /// The item the message was attached to.
        item: ItemHandle,
        /// The request.
        request: LogRequest,
    },
}

/// A created item, as returned by [`RecordingPort::created`].
#[derive(Copy, Clone, Debug)]
pub struct CreatedItem<'a> {
    /// The handle minted for the item.
    pub item: ItemHandle,
    /// The parent item.
    pub parent: Option<ItemHandle>,
    /// The creation request.
    pub request: &'a StartItemRequest,
}

/// A closed item, as returned by [`RecordingPort::closes`].
#[derive(Copy, Clone, Debug)]
pub struct ClosedItem<'a> {
    /// The item that was closed.
    pub item: ItemHandle,
    /// The finish request.
    pub request: &'a FinishItemRequest,
}

/// An [`ItemPort`] that records every call in memory.
///
/// Used for dry runs, and to inspect what the mapper sends to a backend. Handles are minted
/// immediately and never fail to resolve.
#[derive(Clone, Debug, Default)]
pub struct RecordingPort {
    calls: Vec<PortCall>,
}

impl RecordingPort {
    /// Creates a new, empty recording port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> &[PortCall] {
        &self.calls
    }

    /// Returns the launch, if one was started.
    pub fn launch(&self) -> Option<(LaunchHandle, &StartLaunchRequest)> {
        self.calls.iter().find_map(|call| match call {
            PortCall::StartLaunch { launch, request } => Some((*launch, request)),
            _ => None,
        })
    }

    /// Returns true if a launch was finished.
    pub fn is_launch_finished(&self) -> bool {
        self.calls
            .iter()
            .any(|call| matches!(call, PortCall::FinishLaunch { .. }))
    }

    /// Returns the items created so far, in creation order.
    pub fn created(&self) -> impl Iterator<Item = CreatedItem<'_>> + '_ {
        self.calls.iter().filter_map(|call| match call {
            PortCall::CreateItem {
                item,
                parent,
                request,
            } => Some(CreatedItem {
                item: *item,
                parent: *parent,
                request,
            }),
            _ => None,
        })
    }

    /// Returns every close call made so far, in order.
    pub fn closes(&self) -> impl Iterator<Item = ClosedItem<'_>> + '_ {
        self.calls.iter().filter_map(|call| match call {
            PortCall::CloseItem { item, request } => Some(ClosedItem {
                item: *item,
                request,
            }),
            _ => None,
        })
    }

    /// Returns every log message attached so far, in order.
    pub fn logs(&self) -> impl Iterator<Item = (ItemHandle, &LogRequest)> + '_ {
        self.calls.iter().filter_map(|call| match call {
            PortCall::EmitLog { item, request } => Some((*item, request)),
            _ => None,
        })
    }

    /// Returns the creation request for an item.
    pub fn request_for(&self, item: ItemHandle) -> Option<&StartItemRequest> {
        self.created()
            .find(|created| created.item == item)
            .map(|created| created.request)
    }

    /// Returns the parent of an item, or `None` if the item is top-level or unknown.
    pub fn parent_of(&self, item: ItemHandle) -> Option<ItemHandle> {
        self.created()
            .find(|created| created.item == item)
            .and_then(|created| created.parent)
    }

    /// Returns the finish request for an item, or `None` if it was never closed.
    pub fn finish_for(&self, item: ItemHandle) -> Option<&FinishItemRequest> {
        self.closes()
            .find(|closed| closed.item == item)
            .map(|closed| closed.request)
    }

    /// Returns the status an item was closed with.
    ///
    /// The outer `Option` is `None` if the item was never closed; the inner one is `None` if it
    /// was closed without a status.
    pub fn final_status(&self, item: ItemHandle) -> Option<Option<ItemStatus>> {
        self.finish_for(item).map(|request| request.status)
    }

    /// Returns the log messages attached to an item.
    pub fn logs_for(&self, item: ItemHandle) -> impl Iterator<Item = &LogRequest> + '_ {
        self.logs()
            .filter(move |(handle, _)| *handle == item)
            .map(|(_, request)| request)
    }

    /// Returns the first item created with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<ItemHandle> {
        self.created()
            .find(|created| created.request.name == name)
            .map(|created| created.item)
    }

    /// Returns the children of an item (or the top-level items, for `None`), in creation order.
    pub fn children_of(&self, parent: Option<ItemHandle>) -> impl Iterator<Item = CreatedItem<'_>> {
        self.created().filter(move |created| created.parent == parent)
    }

    /// Writes every recorded call as JSON lines.
    pub fn write_json_lines(&self, mut writer: impl Write) -> Result<(), WriteRecordError> {
        for call in &self.calls {
            serde_json::to_writer(&mut writer, call).map_err(WriteRecordError::Serialize)?;
            writer.write_all(b"\n").map_err(WriteRecordError::Io)?;
        }
        writer.flush().map_err(WriteRecordError::Io)
    }

    /// Writes every recorded call as JSON lines to the given path.
    pub fn write_to_path(&self, path: &Utf8Path) -> Result<(), WriteRecordError> {
        let file = File::create(path).map_err(|error| WriteRecordError::Fs {
            file: path.to_owned(),
            error,
        })?;
        self.write_json_lines(BufWriter::new(file))
            .map_err(|error| match error {
                WriteRecordError::Io(error) => WriteRecordError::Fs {
                    file: path.to_owned(),
                    error,
                },
                other => other,
            })
    }
}

impl ItemPort for RecordingPort {
    fn start_launch(&mut self, request: StartLaunchRequest) -> LaunchHandle {
        let launch = LaunchHandle::new();
        self.calls.push(PortCall::StartLaunch { launch, request });
        launch
    }

    fn finish_launch(&mut self, launch: LaunchHandle, end_time: DateTime<FixedOffset>) {
        self.calls.push(PortCall::FinishLaunch { launch, end_time });
    }

    fn create_item(
        &mut self,
        parent: Option<ItemHandle>,
        request: StartItemRequest,
    ) -> ItemHandle {
        let item = ItemHandle::new();
        self.calls.push(PortCall::CreateItem {
            item,
            parent,
            request,
        });
        item
    }

    fn close_item(&mut self, item: ItemHandle, request: FinishItemRequest) {
        self.calls.push(PortCall::CloseItem { item, request });
    }

    fn emit_log(&mut self, item: ItemHandle, request: LogRequest) {
        self.calls.push(PortCall::EmitLog { item, request });
    }
}
