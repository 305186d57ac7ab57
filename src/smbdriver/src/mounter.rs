// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Mount invocation adapter: turns a validated bind-parameter map into a
//! `mount -t cifs` call.
//!
//! Reference: https://www.samba.org/samba/docs/man/manpages-3/mount.cifs.8.html
//!
//! Azure File Service:
//!   required: username, password, vers=3.0
//!   optional: uid, gid, file_mode, dir_mode, readonly | ro
//! Windows share folders:
//!   required: username, password | sec
//!   optional: uid, gid, file_mode, dir_mode, readonly | ro, domain

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use slog::{debug, error, info, o, Logger};
use tokio::fs;

use volume_mount_options::{new_mount_opts, redacted, MountOpts, MountOptsMask};

use crate::invoker::Invoker;
use crate::kernel_mount_options::to_kernel_mount_option_flags_and_env_vars;

// Mounts are owned by the driver user, not by whichever uid the app runs
// as; cell config pins both ids to 2000.
const DRIVER_FORCED_FLAGS: &str = "uid=2000,gid=2000";

const CHECK_MOUNT_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Mounter: Send + Sync {
    async fn mount(
        &self,
        logger: &Logger,
        source: &str,
        target: &str,
        opts: &Map<String, Value>,
    ) -> Result<()>;

    async fn unmount(&self, logger: &Logger, target: &str) -> Result<()>;

    /// Whether `mount_point` is currently mounted. Failures, including
    /// the bounded-deadline timeout, mean "not mounted" and are logged at
    /// info level; created-but-unmounted volumes hit this path routinely.
    async fn check(&self, logger: &Logger, name: &str, mount_point: &str) -> bool;

    /// Lazily unmount and remove every directory below `path`.
    async fn purge(&self, logger: &Logger, path: &str);
}

pub struct SmbMounter {
    invoker: Arc<dyn Invoker>,
    mask: MountOptsMask,
    force_noserverino: bool,
    force_nodfs: bool,
}

impl SmbMounter {
    pub fn new(
        invoker: Arc<dyn Invoker>,
        mask: MountOptsMask,
        force_noserverino: bool,
        force_nodfs: bool,
    ) -> SmbMounter {
        SmbMounter {
            invoker,
            mask,
            force_noserverino,
            force_nodfs,
        }
    }

    fn build_mount_flags(&self, opts: &MountOpts) -> (String, Vec<String>) {
        let (rendered, env_vars) = to_kernel_mount_option_flags_and_env_vars(opts);

        let mut flags = if rendered.is_empty() {
            DRIVER_FORCED_FLAGS.to_string()
        } else {
            format!("{},{}", rendered, DRIVER_FORCED_FLAGS)
        };
        if self.force_noserverino {
            flags.push_str(",noserverino");
        }
        if self.force_nodfs {
            flags.push_str(",nodfs");
        }

        (flags, env_vars)
    }
}

// Errors surfaced to the driver API must carry a description only; the
// invoker already guarantees no environment value is embedded.
fn safe_error(err: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("{}", err)
}

#[async_trait]
impl Mounter for SmbMounter {
    async fn mount(
        &self,
        logger: &Logger,
        source: &str,
        target: &str,
        opts: &Map<String, Value>,
    ) -> Result<()> {
        let logger = logger.new(o!("session" => "smb-mount"));
        info!(logger, "start");

        let mount_opts = match new_mount_opts(opts, &self.mask) {
            Ok(mount_opts) => mount_opts,
            Err(err) => {
                debug!(logger, "error-parse-entries";
                    "given_source" => source,
                    "given_target" => target,
                );
                info!(logger, "end");
                return Err(safe_error(err));
            }
        };

        let (flags, env_vars) = self.build_mount_flags(&mount_opts);

        let args = ["-t", "cifs", source, target, "-o", &flags, "--verbose"];
        debug!(logger, "parse-mount";
            "given_source" => source,
            "given_target" => target,
            "given_options" => format!("{:?}", redacted(&mount_opts, &self.mask)),
            "mount_args" => args.join(" "),
        );

        let result = self
            .invoker
            .invoke(&logger, "mount", &args, &env_vars, None)
            .await
            .map_err(safe_error);
        info!(logger, "end");
        result
    }

    async fn unmount(&self, logger: &Logger, target: &str) -> Result<()> {
        let logger = logger.new(o!("session" => "smb-umount"));
        info!(logger, "start");

        let result = self
            .invoker
            .invoke(&logger, "umount", &["-l", target], &[], None)
            .await
            .map_err(safe_error);
        info!(logger, "end");
        result
    }

    async fn check(&self, logger: &Logger, name: &str, mount_point: &str) -> bool {
        let logger = logger.new(o!("session" => "smb-check-mountpoint"));
        info!(logger, "start");

        let result = self
            .invoker
            .invoke(
                &logger,
                "mountpoint",
                &["-q", mount_point],
                &[],
                Some(CHECK_MOUNT_TIMEOUT),
            )
            .await;
        info!(logger, "end");

        match result {
            Ok(()) => true,
            Err(err) => {
                // Note: Created volumes (with no mounts) will be removed
                //       since VolumeInfo.Mountpoint will be an empty string
                info!(logger, "unable to verify volume {} ({})", name, err);
                false
            }
        }
    }

    async fn purge(&self, logger: &Logger, path: &str) {
        let logger = logger.new(o!("session" => "purge"));
        info!(logger, "start");

        let mut entries = match fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(err) => {
                error!(logger, "purge-readdir-failed";
                    "path" => path, "error" => err.to_string());
                info!(logger, "end");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => {}
                _ => continue,
            }

            let mount_dir = entry.path();
            let mount_dir = mount_dir.to_string_lossy();

            match self
                .invoker
                .invoke(&logger, "umount", &["-l", "-f", &mount_dir], &[], None)
                .await
            {
                Ok(()) => info!(logger, "unmount-successful"; "path" => mount_dir.as_ref()),
                Err(err) => error!(logger, "warning-umount-failed"; "error" => err.to_string()),
            }

            if let Err(err) = fs::remove_dir_all(mount_dir.as_ref()).await {
                error!(logger, "purge-cannot-remove-directory";
                    "path" => mount_dir.as_ref(), "error" => err.to_string());
            } else {
                info!(logger, "remove-directory-successful"; "path" => mount_dir.as_ref());
            }
        }

        info!(logger, "end");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::smb_mount_opts_mask;
    use crate::invoker::InvokerError;
    use crate::logging::discard_logger;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedCall {
        command: String,
        args: Vec<String>,
        env_vars: Vec<String>,
        timeout: Option<Duration>,
    }

    #[derive(Default)]
    struct FakeInvoker {
        fail: bool,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl FakeInvoker {
        fn failing() -> FakeInvoker {
            FakeInvoker {
                fail: true,
                ..Default::default()
            }
        }

        async fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl Invoker for FakeInvoker {
        async fn invoke(
            &self,
            _logger: &Logger,
            command: &str,
            args: &[&str],
            env_vars: &[String],
            timeout: Option<Duration>,
        ) -> Result<(), InvokerError> {
            self.calls.lock().await.push(RecordedCall {
                command: command.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                env_vars: env_vars.to_vec(),
                timeout,
            });

            if self.fail {
                Err(InvokerError::Failed {
                    command: command.to_string(),
                    status: "32".to_string(),
                    stderr: "mount error(13): Permission denied".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn opts(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn mounter(invoker: Arc<FakeInvoker>) -> SmbMounter {
        SmbMounter::new(invoker, smb_mount_opts_mask().unwrap(), false, false)
    }

    #[tokio::test]
    async fn test_mount_invokes_mount_with_rendered_flags() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        m.mount(
            &discard_logger(),
            "//host/share",
            "/data",
            &opts(json!({
                "source": "//host/share",
                "mount": "/data",
                "username": "foo",
                "password": "bar",
                "version": "2.0",
                "mfsymlinks": true,
            })),
        )
        .await
        .unwrap();

        let calls = invoker.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "mount");
        assert_eq!(
            calls[0].args,
            vec![
                "-t",
                "cifs",
                "//host/share",
                "/data",
                "-o",
                "mfsymlinks,vers=2.0,uid=2000,gid=2000",
                "--verbose",
            ]
        );
        assert_eq!(calls[0].env_vars, vec!["PASSWD=bar", "USER=foo"]);
        assert_eq!(calls[0].timeout, None);
    }

    #[tokio::test]
    async fn test_mount_never_places_credentials_on_the_command_line() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        m.mount(
            &discard_logger(),
            "//host/share",
            "/data",
            &opts(json!({"username": "foo", "password": "s3cret"})),
        )
        .await
        .unwrap();

        let args = invoker.calls().await[0].args.join(" ");
        assert!(!args.contains("s3cret"));
        assert!(!args.contains("username="));
        assert!(!args.contains("password="));
    }

    #[tokio::test]
    async fn test_mount_rejects_disallowed_options_without_invoking() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        let err = m
            .mount(
                &discard_logger(),
                "//host/share",
                "/data",
                &opts(json!({"uid": "1000", "gid": "1000"})),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Not allowed options: gid, uid");
        assert!(invoker.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_mount_readonly_renders_bare_ro() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        m.mount(
            &discard_logger(),
            "//host/share",
            "/data",
            &opts(json!({"readonly": true, "username": "foo", "password": "bar"})),
        )
        .await
        .unwrap();

        let calls = invoker.calls().await;
        assert_eq!(calls[0].args[5], "ro,uid=2000,gid=2000");
        assert_eq!(calls[0].env_vars, vec!["PASSWD=bar", "USER=foo"]);
    }

    // The driver does not second-guess option values; a false mfsymlinks
    // resolves fine and the renderer simply omits the flag.
    #[tokio::test]
    async fn test_mount_omits_mfsymlinks_when_false() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        m.mount(
            &discard_logger(),
            "//host/share",
            "/data",
            &opts(json!({"mfsymlinks": false, "username": "foo", "password": "bar"})),
        )
        .await
        .unwrap();

        let calls = invoker.calls().await;
        assert_eq!(calls[0].args[5], "uid=2000,gid=2000");
    }

    #[tokio::test]
    async fn test_mount_passes_unrecognized_version_values_through() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        m.mount(
            &discard_logger(),
            "//host/share",
            "/data",
            &opts(json!({"version": "9.9", "username": "foo", "password": "bar"})),
        )
        .await
        .unwrap();

        let calls = invoker.calls().await;
        assert_eq!(calls[0].args[5], "vers=9.9,uid=2000,gid=2000");
    }

    #[tokio::test]
    async fn test_mount_requires_credentials() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        let err = m
            .mount(
                &discard_logger(),
                "//host/share",
                "/data",
                &opts(json!({"vers": "3.0"})),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Missing mandatory options: password, username"
        );
        assert!(invoker.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_mount_appends_forced_noserverino_and_nodfs() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = SmbMounter::new(invoker.clone(), smb_mount_opts_mask().unwrap(), true, true);

        m.mount(
            &discard_logger(),
            "//host/share",
            "/data",
            &opts(json!({"vers": "3.0", "username": "foo", "password": "bar"})),
        )
        .await
        .unwrap();

        let calls = invoker.calls().await;
        assert_eq!(
            calls[0].args[5],
            "vers=3.0,uid=2000,gid=2000,noserverino,nodfs"
        );
    }

    #[tokio::test]
    async fn test_mount_wraps_invocation_failure_as_safe_error() {
        let invoker = Arc::new(FakeInvoker::failing());
        let m = mounter(invoker);

        let err = m
            .mount(
                &discard_logger(),
                "//host/share",
                "/data",
                &opts(json!({"username": "foo", "password": "bar"})),
            )
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("mount exited with status 32"));
        assert!(!msg.contains("bar"));
    }

    #[tokio::test]
    async fn test_unmount_is_lazy() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        m.unmount(&discard_logger(), "/data").await.unwrap();

        let calls = invoker.calls().await;
        assert_eq!(calls[0].command, "umount");
        assert_eq!(calls[0].args, vec!["-l", "/data"]);
    }

    #[tokio::test]
    async fn test_check_uses_bounded_deadline() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        assert!(m.check(&discard_logger(), "vol-1", "/data").await);

        let calls = invoker.calls().await;
        assert_eq!(calls[0].command, "mountpoint");
        assert_eq!(calls[0].args, vec!["-q", "/data"]);
        assert_eq!(calls[0].timeout, Some(CHECK_MOUNT_TIMEOUT));
    }

    #[tokio::test]
    async fn test_check_treats_failure_as_not_mounted() {
        let invoker = Arc::new(FakeInvoker::failing());
        let m = mounter(invoker);

        assert!(!m.check(&discard_logger(), "vol-1", "/data").await);
    }

    #[tokio::test]
    async fn test_purge_unmounts_and_removes_subdirectories() {
        let invoker = Arc::new(FakeInvoker::default());
        let m = mounter(invoker.clone());

        let root = tempfile::tempdir().unwrap();
        let mount_dir = root.path().join("vol-1");
        std::fs::create_dir(&mount_dir).unwrap();
        std::fs::write(root.path().join("not-a-dir"), b"skip me").unwrap();

        m.purge(&discard_logger(), root.path().to_str().unwrap())
            .await;

        let calls = invoker.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "umount");
        assert_eq!(
            calls[0].args,
            vec!["-l", "-f", mount_dir.to_str().unwrap()]
        );
        assert!(!mount_dir.exists());
        assert!(root.path().join("not-a-dir").exists());
    }
}
