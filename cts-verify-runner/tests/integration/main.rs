// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests that read real result logs from disk.

mod fixtures;
mod reconcile;
mod verify;
