// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verifies conformance submission packages.
//!
//! `cts-verify` extracts a package, checks out the reference source at the package's release, and
//! reconciles every result log against the mustpass lists. The report is printed to stdout and
//! can also be written as JSON or JUnit XML. See [`cts_verify_metadata::VerifyExitCode`] for exit
//! codes.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
