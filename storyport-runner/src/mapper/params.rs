// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder substitution for data-driven nodes.
//!
//! Step templates and scenario titles contain `<key>` placeholders. When a row of values is
//! active, each placeholder with a matching key is replaced with its value, and the substitution
//! is recorded as a [`Parameter`].

use itertools::Itertools;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use storyport_metadata::{ExampleRow, Parameter};
use swrite::{SWrite, swrite};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(.*?)>").expect("placeholder regex is valid"));

/// The result of expanding a template against a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expanded {
    /// The template with known placeholders substituted.
    pub text: String,

    /// The substitutions made, in order of first occurrence in the template.
    ///
    /// A placeholder that occurs more than once is recorded once per occurrence.
    pub parameters: Vec<Parameter>,
}

/// Expands `<key>` placeholders in `template` using values from `row`.
///
/// Placeholders whose key is not in the row are left as-is and are not recorded.
pub fn expand(template: &str, row: &ExampleRow) -> Expanded {
    let mut parameters = Vec::new();
    let text = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let key = &caps[1];
        match row.get(key) {
            Some(value) => {
                parameters.push(Parameter::new(key, value.as_str()));
                value.clone()
            }
            None => caps[0].to_owned(),
        }
    });

    Expanded {
        text: text.into_owned(),
        parameters,
    }
}

/// Returns the display name for an example row: `Example: [k1: v1; k2: v2]`.
pub fn format_row_name(row: &ExampleRow) -> String {
    let mut name = String::from("Example: [");
    for (i, (key, value)) in row.iter().enumerate() {
        if i > 0 {
            name.push_str("; ");
        }
        swrite!(name, "{key}: {value}");
    }
    name.push(']');
    name
}

/// Returns the compact name used in an example row's code reference: `[k1:v1;k2:v2]`.
pub fn row_reference_name(row: &ExampleRow) -> String {
    format!(
        "[{}]",
        row.iter()
            .format_with(";", |(key, value), f| f(&format_args!("{key}:{value}")))
    )
}

/// Returns the test case ID for a node.
///
/// With no parameters this is the code reference itself. Otherwise the parameter values are
/// appended as `[v1,v2]`.
pub fn case_id(code_ref: &str, parameters: &[Parameter]) -> String {
    if parameters.is_empty() {
        code_ref.to_owned()
    } else {
        format!(
            "{code_ref}[{}]",
            parameters.iter().map(|p| p.value.as_str()).join(",")
        )
    }
}
