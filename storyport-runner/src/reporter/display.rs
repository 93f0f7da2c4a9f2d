// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of recorded item trees.
//!
//! # Display rules
//!
//! 1. **Top-level items:** No tree characters.
//! 2. **Children:** `├─` (not last) or `└─` (last).
//! 3. **Continuation lines:** `│  ` when an ancestor has more siblings, spaces otherwise.
//! 4. **Logs:** Shown below their item, indented past the item's branch. Continuation lines of
//!    multi-line messages keep the tree prefix and line up with the first line's text.

use super::recorder::{CreatedItem, RecordingPort};
use crate::mapper::ItemHandle;
use owo_colors::{OwoColorize, Style};
use std::{collections::HashMap, fmt};
use storyport_metadata::{ItemStatus, LogLevel, LogRequest};

/// Styles for displaying item trees.
#[derive(Clone, Debug, Default)]
pub struct Styles {
    /// Style for item names.
    pub name: Style,
    /// Style for item types.
    pub item_type: Style,
    /// Style for the "passed" status.
    pub passed: Style,
    /// Style for the "failed" status.
    pub failed: Style,
    /// Style for the "skipped" status.
    pub skipped: Style,
    /// Style for items without a status, or that were never closed.
    pub unset: Style,
    /// Style for tree characters.
    pub tree: Style,
    /// Style for error-level log messages.
    pub log_error: Style,
    /// Style for other log messages.
    pub log_other: Style,
    /// Style for counts in the summary.
    pub count: Style,
}

impl Styles {
    /// Colorizes the styles for terminal output.
    pub fn colorize(&mut self) {
        self.name = Style::new().bold();
        self.item_type = Style::new().bright_black();
        self.passed = Style::new().bold().green();
        self.failed = Style::new().bold().red();
        self.skipped = Style::new().bold().yellow();
        self.unset = Style::new().dimmed();
        self.tree = Style::new().bright_black();
        self.log_error = Style::new().red();
        self.log_other = Style::new();
        self.count = Style::new().bold();
    }
}

/// A display wrapper for the item tree recorded by a [`RecordingPort`].
#[derive(Clone, Debug)]
pub struct DisplayItemTree<'a> {
    port: &'a RecordingPort,
    index: CallIndex<'a>,
    styles: &'a Styles,
    show_logs: bool,
}

impl<'a> DisplayItemTree<'a> {
    /// Creates a new display wrapper.
    ///
    /// The recorded calls are indexed once here, so rendering is linear in the number of calls.
    pub fn new(port: &'a RecordingPort, styles: &'a Styles) -> Self {
        Self {
            port,
            index: CallIndex::new(port),
            styles,
            show_logs: true,
        }
    }

    /// Sets whether log messages are shown below their items. Defaults to true.
    pub fn show_logs(mut self, show_logs: bool) -> Self {
        self.show_logs = show_logs;
        self
    }

    fn write_item(
        &self,
        f: &mut fmt::Formatter<'_>,
        item: CreatedItem<'_>,
        prefix: &str,
        branch: &str,
    ) -> fmt::Result {
        writeln!(
            f,
            "{}{}{} {} {}",
            prefix.style(self.styles.tree),
            branch.style(self.styles.tree),
            item.request.name.style(self.styles.name),
            item.request.item_type.style(self.styles.item_type),
            self.status_str(item),
        )?;

        let child_prefix = match branch {
            "├─ " => format!("{prefix}│  "),
            "└─ " => format!("{prefix}   "),
            _ => prefix.to_owned(),
        };

        if self.show_logs {
            for log in self.index.logs(item.item) {
                self.write_log(f, log, &child_prefix)?;
            }
        }

        let children = self.index.children(Some(item.item));
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            let branch = if i + 1 == count { "└─ " } else { "├─ " };
            self.write_item(f, *child, &child_prefix, branch)?;
        }
        Ok(())
    }

    fn write_log(
        &self,
        f: &mut fmt::Formatter<'_>,
        log: &LogRequest,
        prefix: &str,
    ) -> fmt::Result {
        let style = match log.level {
            LogLevel::Error => self.styles.log_error,
            _ => self.styles.log_other,
        };
        let level = log.level.to_string();
        let mut lines = log.message.lines();
        writeln!(
            f,
            "{}  {} {}",
            prefix.style(self.styles.tree),
            level.style(style),
            lines.next().unwrap_or_default().style(style),
        )?;
        for line in lines {
            writeln!(
                f,
                "{}  {:width$} {}",
                prefix.style(self.styles.tree),
                "",
                line.style(style),
                width = level.len(),
            )?;
        }
        Ok(())
    }

    fn status_str(&self, item: CreatedItem<'_>) -> String {
        match self.index.status(item.item) {
            Some(Some(ItemStatus::Passed)) => "PASSED".style(self.styles.passed).to_string(),
            Some(Some(ItemStatus::Failed)) => "FAILED".style(self.styles.failed).to_string(),
            Some(Some(ItemStatus::Skipped)) => "SKIPPED".style(self.styles.skipped).to_string(),
            Some(None) => "(no status)".style(self.styles.unset).to_string(),
            None => "(open)".style(self.styles.unset).to_string(),
        }
    }
}

impl fmt::Display for DisplayItemTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.index.children(None) {
            self.write_item(f, *item, "", "")?;
        }

        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for closed in self.port.closes() {
            match closed.request.status {
                Some(ItemStatus::Passed) => passed += 1,
                Some(ItemStatus::Failed) => failed += 1,
                Some(ItemStatus::Skipped) => skipped += 1,
                None => {}
            }
        }
        writeln!(
            f,
            "{} items: {} passed, {} failed, {} skipped",
            self.port.created().count().style(self.styles.count),
            passed.style(self.styles.count),
            failed.style(self.styles.count),
            skipped.style(self.styles.count),
        )
    }
}

/// Parent, log and status lookups over a [`RecordingPort`], built in one pass over its calls.
#[derive(Clone, Debug, Default)]
struct CallIndex<'a> {
    children: HashMap<Option<ItemHandle>, Vec<CreatedItem<'a>>>,
    logs: HashMap<ItemHandle, Vec<&'a LogRequest>>,
    statuses: HashMap<ItemHandle, Option<ItemStatus>>,
}

impl<'a> CallIndex<'a> {
    fn new(port: &'a RecordingPort) -> Self {
        let mut index = Self::default();
        for created in port.created() {
            index
                .children
                .entry(created.parent)
                .or_default()
                .push(created);
        }
        for (item, log) in port.logs() {
            index.logs.entry(item).or_default().push(log);
        }
        // The first close wins, matching RecordingPort::final_status.
        for closed in port.closes() {
            index
                .statuses
                .entry(closed.item)
                .or_insert(closed.request.status);
        }
        index
    }

    fn children(&self, parent: Option<ItemHandle>) -> &[CreatedItem<'a>] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn logs(&self, item: ItemHandle) -> impl Iterator<Item = &'a LogRequest> + '_ {
        self.logs.get(&item).into_iter().flatten().copied()
    }

    fn status(&self, item: ItemHandle) -> Option<Option<ItemStatus>> {
        self.statuses.get(&item).copied()
    }
}
