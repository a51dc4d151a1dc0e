// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `cts-verify` failures.
///
/// `cts-verify` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum VerifyExitCode {}

impl VerifyExitCode {
    /// The package was verified and no failures were recorded.
    pub const OK: i32 = 0;

    /// Verification completed, and at least one failure was recorded in the report.
    pub const VERIFICATION_FAILED: i32 = 100;

    /// A user issue happened while setting up a verification, e.g. an invalid config file.
    pub const SETUP_ERROR: i32 = 96;

    /// The reference source tree could not be obtained, or is not a git work tree.
    pub const SOURCE_UNAVAILABLE: i32 = 97;

    /// The submission package could not be extracted.
    pub const PACKAGE_EXTRACT_FAILED: i32 = 98;

    /// Writing the report to stdout, stderr or the output file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
