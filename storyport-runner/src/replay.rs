// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replaying recorded lifecycle events.
//!
//! Events are stored as JSON lines, one [`LifecycleEvent`] per line. Blank lines are ignored.

use crate::{
    errors::{EventReadError, ReplayError},
    launch::LaunchSession,
    mapper::ItemPort,
};
use camino::Utf8Path;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};
use storyport_metadata::LifecycleEvent;
use tracing::debug;

/// Reads lifecycle events from a JSON-lines source.
#[derive(Debug)]
pub struct EventReader<R> {
    source_name: String,
    lines: io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> EventReader<R> {
    /// Creates a new reader. `source_name` is used in error messages.
    pub fn new(source_name: impl Into<String>, reader: R) -> Self {
        Self {
            source_name: source_name.into(),
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl EventReader<BufReader<File>> {
    /// Opens a JSON-lines file of events.
    pub fn open(path: &Utf8Path) -> Result<Self, EventReadError> {
        let file = File::open(path).map_err(|error| EventReadError::Io {
            source_name: path.to_string(),
            error,
        })?;
        Ok(Self::new(path.as_str(), BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<LifecycleEvent, EventReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(error) => {
                    return Some(Err(EventReadError::Io {
                        source_name: self.source_name.clone(),
                        error,
                    }));
                }
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            return Some(serde_json::from_str(&line).map_err(|error| EventReadError::Parse {
                source_name: self.source_name.clone(),
                line_number: self.line_number,
                error,
            }));
        }
    }
}

/// A summary of a replay.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReplaySummary {
    /// The number of events replayed.
    pub event_count: usize,
}

/// Feeds every event into `session`, stopping at the first error.
pub fn replay<P, I>(events: I, session: &mut LaunchSession<P>) -> Result<ReplaySummary, ReplayError>
where
    P: ItemPort,
    I: IntoIterator<Item = Result<LifecycleEvent, EventReadError>>,
{
    let mut event_count = 0;
    for (event_index, event) in events.into_iter().enumerate() {
        let event = event?;
        let event_name = event.name();
        debug!(event_index, event = event_name, "replaying event");
        session
            .handle_event(event)
            .map_err(|error| ReplayError::Map {
                event_index,
                event_name,
                error,
            })?;
        event_count += 1;
    }
    Ok(ReplaySummary { event_count })
}
