// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use slog::info;

use smbdriver::config::DriverFlags;
use smbdriver::invoker::ProcessInvoker;
use smbdriver::logging;
use smbdriver::mounter::{Mounter, SmbMounter};

// The HTTP driver API lives in the platform layer above this binary; the
// subcommands exercise the same pipeline for operators and tests.
#[derive(Parser)]
#[clap(name = "smbdriver", about = "CIFS volume driver")]
struct Cli {
    #[clap(flatten)]
    flags: DriverFlags,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a CIFS share onto a target directory
    Mount(MountArgs),

    /// Lazily unmount a target directory
    Umount {
        target: String,
    },

    /// Check whether a path is currently mounted; exits non-zero when not
    Check {
        mount_point: String,
    },

    /// Unmount and remove every volume directory under the mount dir
    Purge,
}

#[derive(Args)]
struct MountArgs {
    source: String,
    target: String,

    /// Mount option as `key=value`; a bare key stands for a true flag
    #[clap(short = 'o', long = "opt")]
    options: Vec<String>,
}

fn parse_opts(options: &[String]) -> Map<String, Value> {
    let mut raw = Map::new();
    for option in options {
        match option.split_once('=') {
            Some((key, value)) => {
                raw.insert(key.to_string(), Value::String(value.to_string()));
            }
            None => {
                raw.insert(option.clone(), Value::Bool(true));
            }
        }
    }
    raw
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = logging::parse_level(&cli.flags.log_level)?;
    let logger = logging::create_logger("smbdriver", "main", level, std::io::stdout());
    let _guard = slog_scope::set_global_logger(logger.clone());

    info!(logger, "start");

    let mask = cli
        .flags
        .mount_opts_mask()
        .context("creating config mask")?;
    let mounter = SmbMounter::new(
        Arc::new(ProcessInvoker::default()),
        mask,
        cli.flags.force_noserverino,
        cli.flags.force_nodfs,
    );

    let result = match cli.command {
        Commands::Mount(args) => {
            mounter
                .mount(&logger, &args.source, &args.target, &parse_opts(&args.options))
                .await
        }
        Commands::Umount { target } => mounter.unmount(&logger, &target).await,
        Commands::Check { mount_point } => {
            let mounted = mounter.check(&logger, &mount_point, &mount_point).await;
            info!(logger, "end");
            drop(logger);
            std::process::exit(if mounted { 0 } else { 1 });
        }
        Commands::Purge => {
            mounter.purge(&logger, &cli.flags.mount_dir).await;
            Ok(())
        }
    };

    info!(logger, "end");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_opts_key_value_and_bare_flags() {
        let raw = parse_opts(&[
            "username=foo".to_string(),
            "vers=3.0".to_string(),
            "mfsymlinks".to_string(),
        ]);
        assert_eq!(raw["username"], Value::String("foo".to_string()));
        assert_eq!(raw["vers"], Value::String("3.0".to_string()));
        assert_eq!(raw["mfsymlinks"], Value::Bool(true));
    }

    #[test]
    fn test_cli_parses_mount_subcommand() {
        let cli = Cli::parse_from([
            "smbdriver",
            "--force-noserverino",
            "mount",
            "//host/share",
            "/data",
            "-o",
            "username=foo",
            "-o",
            "password=bar",
        ]);
        assert!(cli.flags.force_noserverino);
        match cli.command {
            Commands::Mount(args) => {
                assert_eq!(args.source, "//host/share");
                assert_eq!(args.target, "/data");
                assert_eq!(args.options.len(), 2);
            }
            _ => panic!("expected mount subcommand"),
        }
    }
}
