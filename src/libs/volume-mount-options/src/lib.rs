// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Mount-option policy and resolution for volume services.
//!
//! A bind request arrives as a free-form JSON object of mount parameters.
//! This crate validates that object against a [`MountOptsMask`] built once
//! at process start and produces a flat, string-valued [`MountOpts`] map
//! that the broker stores as mount config and the driver renders into
//! kernel mount flags.
//!
//! Resolution is a pure function: masks are never mutated, resolved maps
//! are created fresh per call and never cached across bind requests.

mod error;
mod mask;
pub mod utils;
pub mod validators;

pub use error::Error;
pub use mask::{MountOptsMask, UserOptsValidator};

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Resolved mount options: canonical key to string value. Lives only for
/// the duration of a single bind or mount operation.
pub type MountOpts = BTreeMap<String, String>;

/// Placeholder stored and logged in place of secret option values.
pub const REDACTED_VALUE: &str = "<redacted>";

/// Resolve a raw bind-parameter object against a mask.
///
/// Values are uniformed to strings (`true` becomes `"true"`, numbers their
/// decimal form); entries with a `null`, non-scalar, or empty value are
/// skipped outright, which is what keeps an absent value out of the
/// rendered mount command later on. Keys are matched case-insensitively
/// against the alias table and replaced by their canonical spelling.
///
/// Keys outside the allowed set are collected and reported together as
/// [`Error::NotAllowed`]; mandatory keys without a resolved value (a
/// default, a forced value, or a caller-supplied one) are reported as
/// [`Error::MissingMandatory`]. Forced values are merged last, so they win
/// over anything a caller managed to supply.
pub fn new_mount_opts(raw: &Map<String, Value>, mask: &MountOptsMask) -> Result<MountOpts, Error> {
    let mut resolved: MountOpts = mask
        .defaults
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut rejected: Vec<String> = Vec::new();

    for (key, value) in raw {
        let value = match uniform_value(value) {
            Some(v) if !v.is_empty() => v,
            _ => continue,
        };
        if key.is_empty() {
            continue;
        }

        let canonical = mask.canonicalize(key).to_string();
        if mask.ignored.contains(&canonical) {
            continue;
        }

        if !mask.allowed.contains(&canonical) {
            rejected.push(key.clone());
            continue;
        }

        for validate in &mask.validators {
            validate(&key.to_lowercase(), &value)?;
        }

        resolved.insert(canonical, value);
    }

    if !rejected.is_empty() {
        return Err(Error::not_allowed(rejected));
    }

    for (key, value) in &mask.forced {
        resolved.insert(key.clone(), value.clone());
    }

    let missing: Vec<String> = mask
        .mandatory
        .iter()
        .filter(|key| !resolved.contains_key(*key))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Error::missing_mandatory(missing));
    }

    Ok(resolved)
}

/// Copy of `opts` with secret values replaced by [`REDACTED_VALUE`],
/// suitable for logging or persisting alongside a binding record.
pub fn redacted(opts: &MountOpts, mask: &MountOptsMask) -> MountOpts {
    opts.iter()
        .map(|(key, value)| {
            if mask.secret.contains(&key.to_lowercase()) {
                (key.clone(), REDACTED_VALUE.to_string())
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

// JSON scalar to option string; `None` drops the entry.
fn uniform_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
