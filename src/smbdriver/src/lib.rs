// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! CIFS volume driver: validates bind-time mount parameters against the
//! SMB option mask and renders them into `mount -t cifs` invocations with
//! credentials carried in the process environment.

pub mod config;
pub mod invoker;
pub mod kernel_mount_options;
pub mod logging;
pub mod mounter;
