// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-case outcome tags.

use crate::errors::StatusCodeParseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The outcome of a single test case, as recorded in a result log.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum StatusCode {
    /// The test case passed.
    Pass,
    /// The test case failed.
    Fail,
    /// The result was acceptable, but quality was not ideal.
    QualityWarning,
    /// The result was acceptable, but the implementation may have compatibility issues.
    CompatibilityWarning,
    /// The test case hasn't finished.
    Pending,
    /// The tested feature isn't supported by the implementation.
    NotSupported,
    /// A resource required by the test case could not be acquired.
    ResourceError,
    /// An internal error occurred in the test framework or the log was malformed.
    InternalError,
    /// The test process crashed while running the test case.
    Crash,
    /// The test case exceeded its time limit.
    Timeout,
    /// The failure was waived.
    Waiver,
}

impl StatusCode {
    /// All known status codes, in their canonical order.
    pub const ALL: [StatusCode; 11] = [
        StatusCode::Pass,
        StatusCode::Fail,
        StatusCode::QualityWarning,
        StatusCode::CompatibilityWarning,
        StatusCode::Pending,
        StatusCode::NotSupported,
        StatusCode::ResourceError,
        StatusCode::InternalError,
        StatusCode::Crash,
        StatusCode::Timeout,
        StatusCode::Waiver,
    ];

    /// Returns true if this status is an acceptable terminal state for a conformance submission.
    pub fn is_allowed(self) -> bool {
        match self {
            StatusCode::Pass
            | StatusCode::NotSupported
            | StatusCode::QualityWarning
            | StatusCode::CompatibilityWarning
            | StatusCode::Waiver => true,
            StatusCode::Fail
            | StatusCode::Pending
            | StatusCode::ResourceError
            | StatusCode::InternalError
            | StatusCode::Crash
            | StatusCode::Timeout => false,
        }
    }

    /// Returns the string used for this status in result logs.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Pass => "Pass",
            StatusCode::Fail => "Fail",
            StatusCode::QualityWarning => "QualityWarning",
            StatusCode::CompatibilityWarning => "CompatibilityWarning",
            StatusCode::Pending => "Pending",
            StatusCode::NotSupported => "NotSupported",
            StatusCode::ResourceError => "ResourceError",
            StatusCode::InternalError => "InternalError",
            StatusCode::Crash => "Crash",
            StatusCode::Timeout => "Timeout",
            StatusCode::Waiver => "Waiver",
        }
    }

    /// Returns the string forms of all known status codes.
    pub fn variants() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|status| status.as_str())
    }
}

impl FromStr for StatusCode {
    type Err = StatusCodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusCodeParseError::new(s))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
