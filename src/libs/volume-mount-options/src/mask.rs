// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::collections::{HashMap, HashSet};

use crate::error::Error;
use crate::utils::{parse_option_string_to_map, split_csv};

/// Hook validating a single user-supplied `(key, value)` pair while it is
/// being resolved. Runs only for accepted keys, with the caller's spelling
/// lower-cased but not yet alias-normalized.
pub type UserOptsValidator = fn(key: &str, value: &str) -> Result<(), Error>;

/// Immutable policy describing which mount option keys a caller may
/// supply, which must be present, which carry fixed values, how alternate
/// spellings map to canonical keys, and which values are secrets.
///
/// A mask is built once at process start from configuration flags and is
/// then shared read-only across requests; it carries no per-request state.
#[derive(Clone, Debug, Default)]
pub struct MountOptsMask {
    /// Keys a caller may set or override.
    pub allowed: HashSet<String>,
    /// Keys that must have a resolved value, however it got there.
    pub mandatory: HashSet<String>,
    /// Baseline values for allowed keys; callers may overwrite these.
    pub defaults: HashMap<String, String>,
    /// Fixed values for keys outside the allowed set; callers cannot
    /// touch these, so they always win on collision.
    pub forced: HashMap<String, String>,
    /// Alternate spelling (lower-cased) to canonical key.
    pub aliases: HashMap<String, String>,
    /// Keys silently dropped from the incoming map, such as routing
    /// fields the controller injects alongside real mount options.
    pub ignored: HashSet<String>,
    /// Keys whose values must never reach a command line or a log.
    pub secret: HashSet<String>,
    /// Per-key value validators applied during resolution.
    pub validators: Vec<UserOptsValidator>,
}

impl MountOptsMask {
    /// Build a mask from startup configuration.
    ///
    /// `allowed` is a comma-separated key list; an empty string yields an
    /// empty allowed set. `defaults` is a comma-separated `key:value`
    /// list; a pair whose key is allowed becomes an overridable baseline
    /// option, while a pair whose key is not allowed becomes a forced
    /// value. This keeps `allowed` and the forced keys disjoint by
    /// construction.
    pub fn new(
        allowed: &str,
        defaults: &str,
        aliases: &[(&str, &str)],
        ignored: &[&str],
        secret: &[&str],
        mandatory: &[&str],
        validators: Vec<UserOptsValidator>,
    ) -> Result<MountOptsMask, Error> {
        let allowed: HashSet<String> = split_csv(allowed).into_iter().collect();

        let mut default_opts = HashMap::new();
        let mut forced = HashMap::new();
        for (key, value) in parse_option_string_to_map(defaults, ":") {
            if allowed.contains(&key) {
                default_opts.insert(key, value);
            } else {
                forced.insert(key, value);
            }
        }

        Ok(MountOptsMask {
            allowed,
            mandatory: mandatory.iter().map(|k| k.to_string()).collect(),
            defaults: default_opts,
            forced,
            aliases: aliases
                .iter()
                .map(|(from, to)| (from.to_lowercase(), to.to_string()))
                .collect(),
            ignored: ignored.iter().map(|k| k.to_string()).collect(),
            secret: secret.iter().map(|k| k.to_string()).collect(),
            validators,
        })
    }

    /// Canonical spelling for a caller-supplied key: alias lookup is
    /// case-insensitive, unknown keys pass through verbatim.
    pub fn canonicalize<'a>(&'a self, key: &'a str) -> &'a str {
        match self.aliases.get(&key.to_lowercase()) {
            Some(canonical) => canonical.as_str(),
            None => key,
        }
    }
}
