// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Broker-side persistence collaborator: service-instance, binding and
//! file-share records plus advisory locking by name.
//!
//! The broker serializes its provision/bind/unbind/deprovision operations
//! per instance; implementations only have to provide atomic single-record
//! operations and honor the advisory lock protocol.

pub mod sql;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time;

use volume_mount_options::REDACTED_VALUE;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("timed out waiting for lock {name}")]
    LockTimeout { name: String },

    #[error("lock {name} is not held")]
    LockNotHeld { name: String },
}

/// A provisioned service instance. `target_name` is the share URL for
/// preexisting shares, or the storage account name when the broker
/// creates the backing share itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub service_id: String,
    pub plan_id: String,
    pub organization_guid: String,
    pub space_guid: String,
    pub target_name: String,
}

/// Bind-time request detail kept for unbind. `parameters` holds the raw
/// mount options from the bind request and is the only place secrets
/// could leak into storage, hence the redact flag on create.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BindDetails {
    pub app_guid: String,
    pub plan_id: String,
    pub service_id: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// A file share tracked by the broker; `count` is the number of bindings
/// still referencing it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileShare {
    pub instance_id: String,
    pub file_share_name: String,
    pub url: String,
    pub is_created: bool,
    pub count: i32,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_service_instance(
        &self,
        id: &str,
        instance: ServiceInstance,
    ) -> Result<(), StoreError>;
    async fn retrieve_service_instance(&self, id: &str) -> Result<ServiceInstance, StoreError>;
    async fn delete_service_instance(&self, id: &str) -> Result<(), StoreError>;

    /// Persist bind details; with `redact_raw_parameters` the stored copy
    /// carries placeholders instead of the raw parameter values.
    async fn create_binding_details(
        &self,
        id: &str,
        details: BindDetails,
        redact_raw_parameters: bool,
    ) -> Result<(), StoreError>;
    async fn retrieve_binding_details(&self, id: &str) -> Result<BindDetails, StoreError>;
    async fn delete_binding_details(&self, id: &str) -> Result<(), StoreError>;

    async fn create_file_share(&self, id: &str, share: FileShare) -> Result<(), StoreError>;
    async fn retrieve_file_share(&self, id: &str) -> Result<FileShare, StoreError>;
    async fn update_file_share(&self, id: &str, share: FileShare) -> Result<(), StoreError>;
    async fn delete_file_share(&self, id: &str) -> Result<(), StoreError>;

    /// Advisory lock by name; waits up to `timeout_seconds` for a holder
    /// to release before failing with [`StoreError::LockTimeout`].
    async fn get_lock_for_update(
        &self,
        lock_name: &str,
        timeout_seconds: u64,
    ) -> Result<(), StoreError>;
    async fn release_lock_for_update(&self, lock_name: &str) -> Result<(), StoreError>;
}

/// Identifier for the share record belonging to an instance.
pub fn file_share_id(instance_id: &str, file_share_name: &str) -> String {
    format!("{}-{}", instance_id, file_share_name)
}

#[derive(Default)]
struct MemoryStoreInner {
    instances: HashMap<String, ServiceInstance>,
    bindings: HashMap<String, BindDetails>,
    file_shares: HashMap<String, FileShare>,
    locks: HashSet<String>,
}

/// In-memory [`Store`] used by tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

fn redact_parameters(parameters: &mut Map<String, Value>) {
    for value in parameters.values_mut() {
        *value = Value::String(REDACTED_VALUE.to_string());
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_service_instance(
        &self,
        id: &str,
        instance: ServiceInstance,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.instances.contains_key(id) {
            return Err(StoreError::AlreadyExists {
                kind: "service instance",
                id: id.to_string(),
            });
        }
        inner.instances.insert(id.to_string(), instance);
        Ok(())
    }

    async fn retrieve_service_instance(&self, id: &str) -> Result<ServiceInstance, StoreError> {
        self.inner
            .lock()
            .await
            .instances
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "service instance",
                id: id.to_string(),
            })
    }

    async fn delete_service_instance(&self, id: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .instances
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                kind: "service instance",
                id: id.to_string(),
            })
    }

    async fn create_binding_details(
        &self,
        id: &str,
        mut details: BindDetails,
        redact_raw_parameters: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.bindings.contains_key(id) {
            return Err(StoreError::AlreadyExists {
                kind: "binding",
                id: id.to_string(),
            });
        }
        if redact_raw_parameters {
            redact_parameters(&mut details.parameters);
        }
        inner.bindings.insert(id.to_string(), details);
        Ok(())
    }

    async fn retrieve_binding_details(&self, id: &str) -> Result<BindDetails, StoreError> {
        self.inner
            .lock()
            .await
            .bindings
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "binding",
                id: id.to_string(),
            })
    }

    async fn delete_binding_details(&self, id: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .bindings
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                kind: "binding",
                id: id.to_string(),
            })
    }

    async fn create_file_share(&self, id: &str, share: FileShare) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.file_shares.contains_key(id) {
            return Err(StoreError::AlreadyExists {
                kind: "file share",
                id: id.to_string(),
            });
        }
        inner.file_shares.insert(id.to_string(), share);
        Ok(())
    }

    async fn retrieve_file_share(&self, id: &str) -> Result<FileShare, StoreError> {
        self.inner
            .lock()
            .await
            .file_shares
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "file share",
                id: id.to_string(),
            })
    }

    async fn update_file_share(&self, id: &str, share: FileShare) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.file_shares.contains_key(id) {
            return Err(StoreError::NotFound {
                kind: "file share",
                id: id.to_string(),
            });
        }
        inner.file_shares.insert(id.to_string(), share);
        Ok(())
    }

    async fn delete_file_share(&self, id: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .file_shares
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                kind: "file share",
                id: id.to_string(),
            })
    }

    async fn get_lock_for_update(
        &self,
        lock_name: &str,
        timeout_seconds: u64,
    ) -> Result<(), StoreError> {
        let deadline = time::Instant::now() + Duration::from_secs(timeout_seconds);
        loop {
            {
                let mut inner = self.inner.lock().await;
                if inner.locks.insert(lock_name.to_string()) {
                    return Ok(());
                }
            }
            if time::Instant::now() >= deadline {
                return Err(StoreError::LockTimeout {
                    name: lock_name.to_string(),
                });
            }
            time::sleep(LOCK_POLL_INTERVAL).await;
        }
    }

    async fn release_lock_for_update(&self, lock_name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.locks.remove(lock_name) {
            Ok(())
        } else {
            Err(StoreError::LockNotHeld {
                name: lock_name.to_string(),
            })
        }
    }
}
