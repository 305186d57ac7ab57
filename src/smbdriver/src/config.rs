// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

use clap::Args;

use volume_mount_options::{Error, MountOptsMask};

/// Mount options a service binding may set on an SMB volume.
pub const DEFAULT_ALLOWED_OPTIONS: &str = "mfsymlinks,username,password,file_mode,dir_mode,ro,domain,vers,sec,version,noserverino,forceuid,noforceuid,forcegid,noforcegid,nodfs";

// Alternate spellings accepted on the wire.
const SMB_ALIASES: &[(&str, &str)] = &[("readonly", "ro"), ("version", "vers")];

// Routing fields the controller passes along with the mount options.
const SMB_IGNORED: &[&str] = &["source", "mount"];

const SMB_SECRET: &[&str] = &["username", "password"];

const SMB_MANDATORY: &[&str] = &["username", "password"];

/// Driver startup flags. Parsed once in `main` and passed by reference;
/// nothing here is global state.
#[derive(Args, Debug)]
pub struct DriverFlags {
    /// Comma separated list of mount options the service binding may supply
    #[clap(long, default_value = DEFAULT_ALLOWED_OPTIONS)]
    pub allowed_options: String,

    /// Comma separated list of `key:value` mount defaults; keys outside the
    /// allowed set become forced values no binding can override
    #[clap(long, default_value = "")]
    pub default_options: String,

    // Forcing noserverino was added after a stemcell upgrade surfaced SMB
    // servers that suggest inode numbers, failing every mounted app with
    // "Stale file handle". The operator can apply the fix foundation-wide
    // instead of waiting for each space developer to re-bind.
    /// Force all SMB mounts to use the 'noserverino' mount flag, regardless
    /// of what the service binding asks for
    #[clap(long)]
    pub force_noserverino: bool,

    // Same mechanism for a kernel regression in CIFS DFS handling
    // ("cifs_mount failed w/return code = -19" on newer stemcells).
    /// Force all SMB mounts to use the 'nodfs' mount flag, regardless of
    /// what the service binding asks for
    #[clap(long)]
    pub force_nodfs: bool,

    /// Path to directory where volumes are mounted
    #[clap(long, default_value = "/tmp/volumes")]
    pub mount_dir: String,

    /// Minimum level to log (debug, info, warn, error, fatal)
    #[clap(long, default_value = "info")]
    pub log_level: String,
}

impl DriverFlags {
    /// Build the option mask from the startup flags plus the fixed SMB
    /// policy: alias spellings, controller-injected keys to ignore, and
    /// the credential keys that are both secret and mandatory.
    pub fn mount_opts_mask(&self) -> Result<MountOptsMask, Error> {
        MountOptsMask::new(
            &self.allowed_options,
            &self.default_options,
            SMB_ALIASES,
            SMB_IGNORED,
            SMB_SECRET,
            SMB_MANDATORY,
            vec![],
        )
    }
}

/// The stock SMB mask the driver runs with when no flags override it.
pub fn smb_mount_opts_mask() -> Result<MountOptsMask, Error> {
    MountOptsMask::new(
        DEFAULT_ALLOWED_OPTIONS,
        "",
        SMB_ALIASES,
        SMB_IGNORED,
        SMB_SECRET,
        SMB_MANDATORY,
        vec![],
    )
}
