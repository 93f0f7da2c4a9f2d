// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for storyport.
//!
//! The configuration is built from the default config shipped with storyport, with the
//! repository config (`.config/storyport.toml`, or a file passed in explicitly) layered on top.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use storyport_metadata::{Attribute, LaunchMode};
use tracing::warn;

/// Overall configuration for storyport.
#[derive(Clone, Debug)]
pub struct StoryportConfig {
    launch: LaunchConfig,
    items: ItemsConfig,
}

impl StoryportConfig {
    /// The default location of the config within the root directory: `.config/storyport.toml`.
    pub const CONFIG_PATH: &'static str = ".config/storyport.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the storyport config from the given file, or if not specified from
    /// `.config/storyport.toml` in the root directory.
    ///
    /// If the file isn't specified and the directory doesn't have `.config/storyport.toml`, uses
    /// the default config options.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_impl(root, config_file, &mut DefaultConfigWarnings)
    }

    /// Returns the default configuration, without any repository config layered on top.
    pub fn default_config() -> Self {
        let (config, _unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");
        config
            .into_config()
            .expect("default config is always valid")
    }

    /// Returns the launch configuration.
    pub fn launch(&self) -> &LaunchConfig {
        &self.launch
    }

    /// Returns the item configuration.
    pub fn items(&self) -> &ItemsConfig {
        &self.items
    }

    /// Overrides the launch name.
    pub fn set_launch_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.launch.name = name.into();
        self
    }

    /// Appends attributes to the launch.
    pub fn add_launch_attributes(
        &mut self,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> &mut Self {
        self.launch.attributes.extend(attributes);
        self
    }

    // ---
    // Helper methods
    // ---

    fn from_sources_impl(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &unknown);
        }

        config
            .into_config()
            .map_err(|kind| ConfigParseError::new(&config_file, kind))
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(StoryportConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: StoryportConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The config crate also reports the key in some cases. Drop it so the path is
                // only reported once.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

impl Default for StoryportConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Launch-level configuration.
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    /// The name of the launch.
    pub name: String,

    /// The launch description, if any.
    pub description: Option<String>,

    /// The launch mode.
    pub mode: LaunchMode,

    /// Attributes attached to the launch.
    pub attributes: Vec<Attribute>,

    /// Whether skipped items are issues to investigate.
    ///
    /// If false, skipped items are finished with the `NOT_ISSUE` marker.
    pub skipped_issue: bool,
}

/// Item-level configuration.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ItemsConfig {
    /// Item names longer than this many characters are truncated.
    pub max_name_length: usize,
}

/// Trait for handling config warnings.
///
/// The default implementation logs warnings; tests collect them instead.
trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(unknown.iter().next().expect("unknown has one element"));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("ignoring unknown configuration in `{config_file}`: {unknown_str}");
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StoryportConfigDeserialize {
    launch: LaunchConfigDeserialize,
    items: ItemsConfig,
}

impl StoryportConfigDeserialize {
    fn into_config(self) -> Result<StoryportConfig, ConfigParseErrorKind> {
        let LaunchConfigDeserialize {
            name,
            description,
            mode,
            attributes,
            skipped_issue,
        } = self.launch;

        let attributes = attributes
            .iter()
            .enumerate()
            .map(|(index, attribute)| {
                attribute
                    .parse::<Attribute>()
                    .map_err(|err| ConfigParseErrorKind::InvalidAttribute { index, err })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.items.max_name_length == 0 {
            return Err(ConfigParseErrorKind::ZeroMaxNameLength);
        }

        Ok(StoryportConfig {
            launch: LaunchConfig {
                name,
                description: (!description.is_empty()).then_some(description),
                mode,
                attributes,
                skipped_issue,
            },
            items: self.items,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LaunchConfigDeserialize {
    name: String,
    description: String,
    mode: LaunchMode,
    attributes: Vec<String>,
    skipped_issue: bool,
}
