// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Rendering of resolved mount options into the kernel mount-flag string
//! and the disjoint set of credential environment variables.
//!
//! `mount.cifs` reads credentials from `USER`/`PASSWD` in its environment;
//! everything else travels on the command line after `-o`. Rendering is a
//! pure function of its input: output lists are sorted so identical option
//! maps always produce byte-identical results.

use std::collections::{BTreeMap, BTreeSet};

use volume_mount_options::MountOpts;

/// Split resolved options into `(kernel flag string, env var assignments)`.
pub fn to_kernel_mount_option_flags_and_env_vars(
    mount_opts: &MountOpts,
) -> (String, Vec<String>) {
    let (flags, env_vars) = separate_flags_and_env_vars(mount_opts);

    let kernel_flags = render_assignments(sanitize_mount_flags(&flags));
    let kernel_env_vars = render_assignments(sanitize_mount_flags(&env_vars));

    (kernel_flags.join(","), kernel_env_vars)
}

// Credentials go into the environment group, everything else stays a
// command-line flag candidate. Matching is case-insensitive.
fn separate_flags_and_env_vars(mount_opts: &MountOpts) -> (MountOpts, MountOpts) {
    let mut flags = MountOpts::new();
    let mut env_vars = MountOpts::new();

    for (key, value) in mount_opts {
        match key.to_lowercase().as_str() {
            "username" | "password" => {
                env_vars.insert(key.clone(), value.clone());
            }
            _ => {
                flags.insert(key.clone(), value.clone());
            }
        }
    }

    (flags, env_vars)
}

// Apply the option-specific rewrites: credential renaming, empty-domain
// suppression, valueless boolean flags, and the bare `ro` flag.
fn sanitize_mount_flags(mount_opts: &MountOpts) -> (BTreeMap<String, String>, BTreeSet<String>) {
    let mut result = BTreeMap::new();
    let mut valueless = BTreeSet::new();

    for (key, value) in mount_opts {
        match key.to_lowercase().as_str() {
            "username" => {
                result.insert("USER".to_string(), value.clone());
            }
            "password" => {
                result.insert("PASSWD".to_string(), value.clone());
            }
            "domain" => {
                // Never force an empty domain into the mount command.
                if !value.is_empty() {
                    result.insert("domain".to_string(), value.clone());
                }
            }
            flag @ ("mfsymlinks" | "nodfs") => {
                if value == "true" || value.is_empty() {
                    valueless.insert(flag.to_string());
                }
            }
            "readonly" | "ro" => {
                valueless.insert("ro".to_string());
            }
            _ => {
                result.insert(key.clone(), value.clone());
            }
        }
    }

    (result, valueless)
}

// `key=value` assignments plus bare flags, sorted. A value that round-trips
// through base-10 i16 parsing is re-emitted in its parsed decimal form;
// that 16-bit width is a legacy constraint of the original renderer and
// out-of-range values deliberately fall back to verbatim rendering.
fn render_assignments(
    (mount_opts, valueless): (BTreeMap<String, String>, BTreeSet<String>),
) -> Vec<String> {
    let mut params: Vec<String> = mount_opts
        .iter()
        .map(|(key, value)| match value.parse::<i16>() {
            Ok(n) => format!("{}={}", key, n),
            Err(_) => format!("{}={}", key, value),
        })
        .collect();

    params.extend(valueless);
    params.sort();
    params
}
