// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checks that a result log was produced from the expected source revision.

use crate::{errors::SourceRevisionParseError, reporter::ReportSink};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// The session info key holding the release name.
pub const RELEASE_NAME_KEY: &str = "releaseName";

/// The session info key holding the release id.
pub const RELEASE_ID_KEY: &str = "releaseId";

/// A full source revision hash, as printed by `git rev-parse HEAD`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SourceRevision(String);

impl SourceRevision {
    /// The number of leading hex digits embedded in the release id.
    pub const SHORT_LEN: usize = 8;

    /// Returns the full revision hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first [`Self::SHORT_LEN`] hex digits of the revision.
    pub fn short(&self) -> &str {
        &self.0[..Self::SHORT_LEN]
    }

    /// The release name a log built from this revision is expected to carry.
    pub fn expected_release_name(&self) -> String {
        format!("git-{}", self.0)
    }

    /// The release id a log built from this revision is expected to carry.
    pub fn expected_release_id(&self) -> String {
        format!("0x{}", self.short())
    }
}

impl FromStr for SourceRevision {
    type Err = SourceRevisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() >= Self::SHORT_LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(SourceRevisionParseError::new(s))
        }
    }
}

impl fmt::Display for SourceRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Verifies the revision metadata embedded in a log against `revision`.
///
/// The release name and the release id are checked independently, so a log with both fields wrong
/// produces two failures. Returns true if any check failed.
pub fn verify_file_integrity(
    sink: &mut dyn ReportSink,
    log_name: &str,
    session_info: &BTreeMap<String, String>,
    revision: &SourceRevision,
) -> bool {
    sink.message("Verifying file integrity.", Some(log_name));

    let name_error = check_field(
        sink,
        log_name,
        session_info,
        RELEASE_NAME_KEY,
        &revision.expected_release_name(),
    );
    let id_error = check_field(
        sink,
        log_name,
        session_info,
        RELEASE_ID_KEY,
        &revision.expected_release_id(),
    );

    name_error || id_error
}

fn check_field(
    sink: &mut dyn ReportSink,
    log_name: &str,
    session_info: &BTreeMap<String, String>,
    key: &str,
    expected: &str,
) -> bool {
    match session_info.get(key) {
        None => {
            sink.failure(&format!("Test log is missing {key}"), Some(log_name));
            true
        }
        Some(found) if found == expected => {
            sink.passed(
                &format!("Test log {key} matches the checked out source revision: {expected}"),
                Some(log_name),
            );
            false
        }
        Some(found) => {
            sink.failure(
                &format!(
                    "Test log {key} doesn't match the checked out source revision: \
                     expected {expected}, found {found}"
                ),
                Some(log_name),
            );
            true
        }
    }
}
