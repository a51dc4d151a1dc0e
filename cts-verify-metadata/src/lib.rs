// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Documented exit codes and machine-readable report summaries for `cts-verify`.
//!
//! The types in this crate are stable: a JSON report written with
//! `cts-verify --output-format json` can be read back with [`ReportSummary::parse_json`].

mod exit_codes;
mod report;

pub use exit_codes::*;
pub use report::*;
