// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use storyport_metadata::StoryportExitCode;
use storyport_runner::errors::{ConfigParseError, EventReadError, ReplayError, WriteRecordError};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected failure: bad input or configuration rather than a bug in storyport.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("event read error")]
    EventReadError {
        #[from]
        err: EventReadError,
    },
    #[error("replay error")]
    ReplayError {
        #[from]
        err: ReplayError,
    },
    #[error("error writing recorded item calls")]
    WriteRecordError {
        output_file: Utf8PathBuf,
        #[source]
        err: WriteRecordError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_record_error(
        output_file: impl Into<Utf8PathBuf>,
        err: WriteRecordError,
    ) -> Self {
        Self::WriteRecordError {
            output_file: output_file.into(),
            err,
        }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } => StoryportExitCode::INVALID_CONFIG,
            Self::EventReadError { .. } => StoryportExitCode::EVENT_READ_FAILED,
            Self::ReplayError { err } => match err {
                ReplayError::Read(_) => StoryportExitCode::EVENT_READ_FAILED,
                ReplayError::Map { .. } => StoryportExitCode::EVENT_SEQUENCE_INVALID,
                _ => StoryportExitCode::SETUP_ERROR,
            },
            Self::WriteRecordError { .. } | Self::WriteOutputError { .. } => {
                StoryportExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse storyport config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::EventReadError { err } => {
                error!("failed to open event stream");
                Some(err as &dyn Error)
            }
            Self::ReplayError { err } => match err {
                ReplayError::Read(err) => {
                    error!("failed to read event stream");
                    Some(err as &dyn Error)
                }
                ReplayError::Map {
                    event_index,
                    event_name,
                    error,
                } => {
                    error!(
                        "event #{} ({}) does not fit the run so far",
                        event_index.style(styles.bold),
                        event_name.style(styles.bold),
                    );
                    Some(error as &dyn Error)
                }
                other => {
                    error!("failed to replay events");
                    other.source()
                }
            },
            Self::WriteRecordError { output_file, err } => {
                error!(
                    "failed to write recorded item calls to `{}`",
                    output_file.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
