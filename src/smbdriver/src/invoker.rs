// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Process-invocation collaborator used by the mounter.
//!
//! One invocation per call, no internal retries. Environment variable
//! values are passed to the child process but never logged and never
//! embedded in errors; only the variable names may appear.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use slog::{debug, Logger};
use thiserror::Error;
use tokio::process::Command;
use tokio::time;

#[derive(Error, Debug)]
pub enum InvokerError {
    #[error("failed to start {command}: {source}")]
    Start {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with status {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

#[async_trait]
pub trait Invoker: Send + Sync {
    /// Run `command` with `args` and the given `KEY=value` environment
    /// overlay, waiting at most `timeout` when one is supplied.
    async fn invoke(
        &self,
        logger: &Logger,
        command: &str,
        args: &[&str],
        env_vars: &[String],
        timeout: Option<Duration>,
    ) -> Result<(), InvokerError>;
}

/// [`Invoker`] backed by real child processes.
#[derive(Debug, Default)]
pub struct ProcessInvoker {}

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(
        &self,
        logger: &Logger,
        command: &str,
        args: &[&str],
        env_vars: &[String],
        timeout: Option<Duration>,
    ) -> Result<(), InvokerError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut env_names = Vec::with_capacity(env_vars.len());
        for assignment in env_vars {
            let (name, value) = assignment.split_once('=').unwrap_or((assignment, ""));
            cmd.env(name, value);
            env_names.push(name);
        }

        debug!(logger, "invoke";
            "command" => command,
            "args" => args.join(" "),
            "env" => env_names.join(","),
        );

        let wait = cmd.output();
        let output = match timeout {
            Some(limit) => time::timeout(limit, wait).await.map_err(|_| {
                InvokerError::Timeout {
                    command: command.to_string(),
                    timeout: limit,
                }
            })?,
            None => wait.await,
        }
        .map_err(|e| InvokerError::Start {
            command: command.to_string(),
            source: e,
        })?;

        if output.status.success() {
            return Ok(());
        }

        Err(InvokerError::Failed {
            command: command.to_string(),
            status: output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
