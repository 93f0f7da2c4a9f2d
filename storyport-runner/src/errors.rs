// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by storyport.

use camino::Utf8PathBuf;
use config::ConfigError;
use storyport_metadata::AttributeParseError;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse storyport config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// A launch attribute could not be parsed.
    #[error("invalid launch attribute at `launch.attributes[{index}]`")]
    InvalidAttribute {
        /// The index of the attribute in the list.
        index: usize,

        /// The underlying parse error.
        #[source]
        err: AttributeParseError,
    },

    /// The configured maximum name length was zero.
    #[error("`items.max-name-length` must be at least 1")]
    ZeroMaxNameLength,
}

/// A lifecycle event arrived in a state where it cannot be mapped without corrupting the tree.
///
/// Most out-of-order events (for example, a step outcome without an open step) are ignored
/// instead. This error is reserved for events that have nowhere to attach at all.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MapperError {
    /// The event requires an open story, but no story was open.
    #[error("`{event}` received while no story is open")]
    NoOpenSuite {
        /// The name of the event.
        event: &'static str,
    },
}

/// An error that occurred while reading lifecycle events from a JSON-lines stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventReadError {
    /// An error occurred while reading from the source.
    #[error("error reading events from {source_name}")]
    Io {
        /// The name of the source (a file path, or `<stdin>`).
        source_name: String,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// A line could not be parsed as a lifecycle event.
    #[error("error parsing event at {source_name}:{line_number}")]
    Parse {
        /// The name of the source.
        source_name: String,

        /// The one-based line number.
        line_number: usize,

        /// The underlying JSON error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurred while replaying a stream of lifecycle events.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReplayError {
    /// The events could not be read.
    #[error("failed to read events")]
    Read(#[from] EventReadError),

    /// An event could not be mapped.
    #[error("failed to map event #{event_index} (`{event_name}`)")]
    Map {
        /// The zero-based index of the event in the stream.
        event_index: usize,

        /// The name of the event.
        event_name: &'static str,

        /// The underlying mapper error.
        #[source]
        error: MapperError,
    },
}

/// An error that occurred while writing recorded item calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteRecordError {
    /// An error occurred while writing to the output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while serializing a recorded call.
    #[error("error serializing recorded item call")]
    Serialize(#[source] serde_json::Error),
}
