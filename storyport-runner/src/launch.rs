// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Launch sessions.
//!
//! A launch groups every item reported for one run. [`LaunchSession`] starts the launch, feeds
//! lifecycle events to a [`TreeMapper`], and finishes the launch once stragglers are closed.

use crate::{
    config::StoryportConfig,
    errors::MapperError,
    helpers::now,
    mapper::{ItemPort, LaunchHandle, MapperSettings, TreeMapper, tree::ExecutionTree},
};
use storyport_metadata::{Attribute, LifecycleEvent, StartLaunchRequest};
use tracing::info;

/// The key of the system attribute recording the skipped-issue setting.
pub const SKIPPED_ISSUE_KEY: &str = "skippedIssue";

/// A launch in progress.
#[derive(Debug)]
pub struct LaunchSession<P> {
    launch: LaunchHandle,
    mapper: TreeMapper<P>,
}

impl<P: ItemPort> LaunchSession<P> {
    /// Starts a launch through `port`, configured by `config`.
    pub fn start(mut port: P, config: &StoryportConfig) -> Self {
        let launch_config = config.launch();
        let mut attributes = launch_config.attributes.clone();
        attributes.push(
            Attribute::new(SKIPPED_ISSUE_KEY, launch_config.skipped_issue.to_string())
                .into_system(),
        );

        let launch = port.start_launch(StartLaunchRequest {
            name: launch_config.name.clone(),
            description: launch_config.description.clone(),
            mode: launch_config.mode,
            attributes,
            start_time: now(),
        });
        info!(name = %launch_config.name, %launch, "started launch");

        Self {
            launch,
            mapper: TreeMapper::new(port, MapperSettings::from_config(config)),
        }
    }

    /// Returns the launch handle.
    pub fn launch(&self) -> LaunchHandle {
        self.launch
    }

    /// Returns the mapper driving this launch.
    pub fn mapper(&self) -> &TreeMapper<P> {
        &self.mapper
    }

    /// Returns the mapper driving this launch, for calling transitions directly.
    pub fn mapper_mut(&mut self) -> &mut TreeMapper<P> {
        &mut self.mapper
    }

    /// Feeds a lifecycle event to the mapper.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> Result<(), MapperError> {
        self.mapper.handle_event(event)
    }

    /// Finishes the launch, closing any items that are still open as failed.
    ///
    /// Returns the port and the final execution tree.
    pub fn finish(self) -> (P, ExecutionTree) {
        let (mut port, tree) = self.mapper.finish();
        port.finish_launch(self.launch, now());
        info!(launch = %self.launch, items = tree.len(), "finished launch");
        (port, tree)
    }
}
