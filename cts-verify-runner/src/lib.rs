// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for `cts-verify`: checks that a conformance submission package contains a
//! complete, untampered run of the mandated test cases.
//!
//! The basic flow is:
//!
//! 1. The package is extracted ([`package::extract_package`]) and its layout resolved
//!    ([`package::PackageLayout`]).
//! 2. The reference source tree is checked out at the package's release tag
//!    ([`source::SourceTree`]).
//! 3. Each group of result logs is reconciled against the mustpass lists
//!    ([`reconcile::Reconciler`]), writing pass/fail entries to a [`reporter::ReportSink`].

pub mod config;
pub mod errors;
pub mod integrity;
pub mod log_parser;
pub mod mustpass;
pub mod package;
pub mod reconcile;
pub mod reporter;
pub mod source;
pub mod status;
pub mod validate;
pub mod verify;
