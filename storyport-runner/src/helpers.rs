// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, FixedOffset, Local};
use itertools::Itertools;
use std::borrow::Cow;
use storyport_metadata::{Attribute, Meta};

/// The name sent for items whose name is empty.
pub(crate) const UNKNOWN_NAME: &str = "UNKNOWN";

/// Returns the current time with the local offset.
pub(crate) fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Normalizes an item name for the backend.
///
/// Empty names become [`UNKNOWN_NAME`]. Names longer than `max_len` characters are truncated to
/// `max_len - 1` characters.
pub(crate) fn normalize_name(name: &str, max_len: usize) -> Cow<'_, str> {
    if name.is_empty() {
        return Cow::Borrowed(UNKNOWN_NAME);
    }
    if name.chars().count() <= max_len {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.chars().take(max_len.saturating_sub(1)).collect())
    }
}

/// Converts meta properties to item attributes.
///
/// Properties with a value become `key:value` attributes, and properties without one become
/// tags.
pub(crate) fn meta_attributes(meta: &Meta) -> Vec<Attribute> {
    meta.iter()
        .map(|(key, value)| {
            if value.is_empty() {
                Attribute::tag(key)
            } else {
                Attribute::new(key, value)
            }
        })
        .collect()
}

/// Joins meta properties into a single space-separated `key:value` string.
pub(crate) fn join_meta<'a>(metas: impl IntoIterator<Item = &'a Meta>) -> String {
    metas
        .into_iter()
        .flat_map(|meta| meta.iter())
        .map(|(key, value)| {
            if value.is_empty() {
                key.clone()
            } else {
                format!("{key}:{value}")
            }
        })
        .join(" ")
}

/// Merges several meta maps, with later maps overriding earlier ones.
pub(crate) fn merge_meta<'a>(metas: impl IntoIterator<Item = &'a Meta>) -> Meta {
    let mut merged = Meta::new();
    for meta in metas {
        merged.extend(meta.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Joins non-empty description fragments with newlines, returning `None` if all are empty.
pub(crate) fn join_description<'a>(parts: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let joined = parts.into_iter().filter(|part| !part.is_empty()).join("\n");
    (!joined.is_empty()).then_some(joined)
}
