// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::SubmissionNameError;
use std::fmt;

/// The API a submission is for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ApiType {
    /// Vulkan (`VK`).
    Vulkan,
    /// OpenGL (`GL`).
    OpenGl,
    /// OpenGL ES (`ES`).
    OpenGlEs,
}

impl ApiType {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "VK" => Some(Self::Vulkan),
            "GL" => Some(Self::OpenGl),
            "ES" => Some(Self::OpenGlEs),
            _ => None,
        }
    }

    /// Returns the two-letter code used in package names.
    pub fn code(self) -> &'static str {
        match self {
            Self::Vulkan => "VK",
            Self::OpenGl => "GL",
            Self::OpenGlEs => "ES",
        }
    }

    /// Returns the display name of the API.
    pub fn name(self) -> &'static str {
        match self {
            Self::Vulkan => "Vulkan",
            Self::OpenGl => "OpenGL",
            Self::OpenGlEs => "OpenGL ES",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An API version, as encoded in package names (`32` is 3.2).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ApiVersion {
    major: u8,
    minor: u8,
}

impl ApiVersion {
    const KNOWN: &'static [(u8, u8)] = &[
        (1, 0),
        (1, 1),
        (1, 2),
        (2, 0),
        (3, 0),
        (3, 1),
        (3, 2),
        (3, 3),
        (4, 0),
        (4, 1),
        (4, 2),
        (4, 3),
        (4, 4),
        (4, 5),
        (4, 6),
    ];

    fn from_code(code: &str) -> Option<Self> {
        let mut digits = code.chars().map(|c| c.to_digit(10));
        let (Some(Some(major)), Some(Some(minor)), None) =
            (digits.next(), digits.next(), digits.next())
        else {
            return None;
        };
        // Both digits are below 10.
        let version = (major as u8, minor as u8);
        Self::KNOWN.contains(&version).then_some(Self {
            major: version.0,
            minor: version.1,
        })
    }

    /// Returns the major version.
    pub fn major(self) -> u8 {
        self.major
    }

    /// Returns the minor version.
    pub fn minor(self) -> u8 {
        self.minor
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Splits a `<id>-<rest>` package name into the submission id and the rest of the name.
pub fn parse_submission_id(file_name: &str) -> Result<(&str, &str), SubmissionNameError> {
    file_name
        .split_once('-')
        .ok_or(SubmissionNameError::MissingSubmissionId)
}

/// A parsed package file name, `[<id>-]<API><version>_<Adopter>_<Info>.tgz`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmissionName {
    submission_id: Option<String>,
    api: ApiType,
    version: ApiVersion,
}

impl SubmissionName {
    /// Parses a package file name.
    ///
    /// With `khronos`, the name starts with a submission id followed by a dash. A missing dash is
    /// not an error here: the name is then parsed from the start, and the caller is expected to
    /// have reported [`parse_submission_id`]'s error.
    pub fn parse(file_name: &str, khronos: bool) -> Result<Self, SubmissionNameError> {
        let (submission_id, rest) = if khronos {
            match parse_submission_id(file_name) {
                Ok((id, rest)) => (Some(id.to_owned()), rest),
                Err(_) => (None, file_name),
            }
        } else {
            (None, file_name)
        };

        let incorrect = || SubmissionNameError::IncorrectName {
            file_name: file_name.to_owned(),
        };
        let api = rest.get(..2).and_then(ApiType::from_code).ok_or_else(incorrect)?;
        let version = rest
            .get(2..4)
            .and_then(ApiVersion::from_code)
            .ok_or_else(incorrect)?;

        Ok(Self {
            submission_id,
            api,
            version,
        })
    }

    /// Returns the submission id, if the name had one.
    pub fn submission_id(&self) -> Option<&str> {
        self.submission_id.as_deref()
    }

    /// Returns the API.
    pub fn api(&self) -> ApiType {
        self.api
    }

    /// Returns the API version.
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Returns true if submissions of this API and version can be verified.
    pub fn is_supported(&self) -> bool {
        match self.api {
            ApiType::Vulkan | ApiType::OpenGl => true,
            ApiType::OpenGlEs => matches!((self.version.major, self.version.minor), (2, 0) | (3, 0..=2)),
        }
    }

    /// Returns the API and version, e.g. `OpenGL ES 3.2`.
    pub fn api_name(&self) -> String {
        format!("{} {}", self.api, self.version)
    }
}
