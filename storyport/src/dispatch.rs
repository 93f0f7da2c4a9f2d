// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line parsing and command routing.

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use storyport_metadata::{Attribute, ItemStatus, StoryportExitCode};
use storyport_runner::{
    config::StoryportConfig,
    launch::LaunchSession,
    replay::{EventReader, ReplaySummary, replay},
    reporter::{DisplayItemTree, RecordingPort},
};
use swrite::{SWrite, swriteln};
use tracing::info;

/// Mirror story runs as item trees in a reporting backend.
///
/// Storyport maps the lifecycle events of a story run (stories, scenarios, example tables, steps
/// and hooks) onto a tree of reporting items.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct StoryportApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl StoryportApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Replay(opts) => opts.exec(output, output_writer),
            Command::ShowConfig(opts) => opts.exec(output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a recorded event stream and show the resulting item tree
    ///
    /// Events are read as JSON lines, one lifecycle event per line. The items are recorded in
    /// memory rather than sent to a backend.
    Replay(ReplayOpts),

    /// Show the effective configuration
    ShowConfig(ConfigOpts),
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Directory to look for `.config/storyport.toml` in
    #[arg(long, value_name = "DIR", default_value = ".")]
    root_dir: Utf8PathBuf,

    /// Config file [default: <root-dir>/.config/storyport.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn load(&self) -> Result<StoryportConfig> {
        Ok(StoryportConfig::from_sources(
            &self.root_dir,
            self.config_file.as_deref(),
        )?)
    }

    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.load()?;
        let mut writer = output_writer.stdout_writer();
        writer
            .write_all(describe_config(&config).as_bytes())
            .and_then(|()| writer.flush())
            .map_err(ExpectedError::write_output_error)?;
        Ok(StoryportExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct ReplayOpts {
    /// JSON-lines file of lifecycle events, or `-` for stdin
    #[arg(value_name = "EVENTS")]
    events: Utf8PathBuf,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    /// Override the launch name
    #[arg(long, value_name = "NAME")]
    launch_name: Option<String>,

    /// Add a launch attribute, as `key:value` or `value` (can be repeated)
    #[arg(long = "launch-attribute", value_name = "ATTR")]
    launch_attributes: Vec<Attribute>,

    /// Write the recorded item calls to this file, as JSON lines
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<Utf8PathBuf>,

    /// Don't show log messages under their items
    #[arg(long)]
    no_logs: bool,
}

impl ReplayOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let mut config = self.config_opts.load()?;
        if let Some(name) = self.launch_name {
            config.set_launch_name(name);
        }
        config.add_launch_attributes(self.launch_attributes);

        let mut session = LaunchSession::start(RecordingPort::new(), &config);
        let summary = replay_events(&self.events, &mut session)?;
        let (port, tree) = session.finish();
        info!(
            events = summary.event_count,
            items = tree.len(),
            "replayed event stream"
        );

        if let Some(path) = &self.output {
            port.write_to_path(path)
                .map_err(|err| ExpectedError::write_record_error(path.clone(), err))?;
        }

        let styles = output.tree_styles();
        let display = DisplayItemTree::new(&port, &styles).show_logs(!self.no_logs);
        let mut writer = output_writer.stdout_writer();
        write!(writer, "{display}")
            .and_then(|()| writer.flush())
            .map_err(ExpectedError::write_output_error)?;

        let any_failed = port
            .children_of(None)
            .any(|story| port.final_status(story.item) == Some(Some(ItemStatus::Failed)));
        Ok(if any_failed {
            StoryportExitCode::RUN_FAILED
        } else {
            StoryportExitCode::OK
        })
    }
}

fn replay_events(
    events: &Utf8Path,
    session: &mut LaunchSession<RecordingPort>,
) -> Result<ReplaySummary> {
    let summary = if events.as_str() == "-" {
        let reader = EventReader::new("<stdin>", std::io::stdin().lock());
        replay(reader, session)?
    } else {
        replay(EventReader::open(events)?, session)?
    };
    Ok(summary)
}

fn describe_config(config: &StoryportConfig) -> String {
    let launch = config.launch();
    let mut out = String::new();
    swriteln!(out, "[launch]");
    swriteln!(out, "name = {:?}", launch.name);
    swriteln!(
        out,
        "description = {:?}",
        launch.description.as_deref().unwrap_or_default()
    );
    swriteln!(out, "mode = {:?}", launch.mode.as_str());
    let attributes: Vec<_> = launch
        .attributes
        .iter()
        .map(|attribute| attribute.to_string())
        .collect();
    swriteln!(out, "attributes = {attributes:?}");
    swriteln!(out, "skipped-issue = {}", launch.skipped_issue);
    out.push('\n');
    swriteln!(out, "[items]");
    swriteln!(out, "max-name-length = {}", config.items().max_name_length);
    out
}
