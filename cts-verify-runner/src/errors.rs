// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by cts-verify.

use crate::status::StatusCode;
use camino::Utf8PathBuf;
use config::ConfigError;
use itertools::Itertools;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse cts-verify config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),
    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
    /// A release pattern was not a valid regular expression.
    #[error("invalid regular expression `{pattern}` in `releases.{list}`")]
    InvalidReleasePattern {
        /// The list the pattern came from.
        list: &'static str,
        /// The pattern as written.
        pattern: String,
        /// The underlying error.
        #[source]
        err: regex::Error,
    },
    /// A mustpass template was empty.
    #[error("mustpass template `mustpass.{name}` is empty")]
    EmptyMustpassTemplate {
        /// The name of the template key.
        name: &'static str,
    },
}

/// An error that occurs while parsing a [`StatusCode`] from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized status code: {input}\n(known values: {})",
    StatusCode::variants().join(", "),
)]
pub struct StatusCodeParseError {
    input: String,
}

impl StatusCodeParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that occurs while reading the status out of a test case's XML body.
#[derive(Debug, Error)]
pub enum XmlStatusError {
    /// The body has no `<Result>` element.
    #[error("no <Result> element")]
    NoResult,

    /// The `<Result>` element carries no status code.
    #[error("<Result> element has no StatusCode attribute")]
    NoStatusCode,

    /// The body is not well-formed XML.
    #[error("malformed XML")]
    Xml(#[source] quick_xml::Error),

    /// The status code is not one of the known values.
    #[error(transparent)]
    Status(#[from] StatusCodeParseError),
}

/// An error that occurs while loading a mustpass list.
#[derive(Debug, Error)]
pub enum MustpassLoadError {
    /// The mustpass file could not be read.
    #[error("failed to open mustpass file `{path}`")]
    Read {
        /// The path to the mustpass file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The mustpass file lists the same case more than once.
    #[error(
        "mustpass file `{path}` lists `{case}` more than once (lines {first_line} and {line})"
    )]
    DuplicateCase {
        /// The path to the mustpass file.
        path: Utf8PathBuf,
        /// The duplicated case identifier.
        case: String,
        /// The 1-based line the case first appeared on.
        first_line: usize,
        /// The 1-based line the duplicate appeared on.
        line: usize,
    },
}

/// An error that occurs while reading a result log.
#[derive(Debug, Error)]
#[error("failed to read test log `{path}`")]
pub struct LogReadError {
    path: Utf8PathBuf,
    #[source]
    err: std::io::Error,
}

impl LogReadError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self {
            path: path.into(),
            err,
        }
    }

    /// Returns the path of the log that could not be read.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that occurs while parsing a source revision.
#[derive(Clone, Debug, Error)]
#[error("invalid source revision `{input}`: expected at least 8 hexadecimal digits")]
pub struct SourceRevisionParseError {
    input: String,
}

impl SourceRevisionParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurs while obtaining or querying the reference source tree.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Executing git failed.
    #[error("failed to execute `{command}` in `{dir}`")]
    GitExec {
        /// The command line that was run.
        command: String,
        /// The working directory the command was run in.
        dir: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// Git exited with a failure.
    #[error("`{command}` in `{dir}` failed{}", fmt_exit_code(*.exit_code))]
    GitFailed {
        /// The command line that was run.
        command: String,
        /// The working directory the command was run in.
        dir: Utf8PathBuf,
        /// The exit code, if the process exited normally.
        exit_code: Option<i32>,
        /// Standard error for the process.
        stderr: String,
    },

    /// Git produced output that was not valid UTF-8.
    #[error("`{command}` produced non-UTF-8 output")]
    NonUtf8Output {
        /// The command line that was run.
        command: String,
    },

    /// The path is not inside a git work tree.
    #[error("`{dir}` is not a git work tree")]
    NotWorkTree {
        /// The directory that was checked.
        dir: Utf8PathBuf,
    },

    /// The clone destination could not be resolved or its parent created.
    #[error("failed to prepare clone destination `{dest}`")]
    CloneDest {
        /// The clone destination.
        dest: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// No mirror could be cloned.
    #[error(
        "failed to clone the reference source into `{dest}` (tried {})",
        .mirrors.join(", "),
    )]
    AllMirrorsFailed {
        /// The clone destination.
        dest: Utf8PathBuf,
        /// The mirrors that were tried, in order.
        mirrors: Vec<String>,
    },

    /// `git rev-parse HEAD` printed something that isn't a revision.
    #[error("failed to read the HEAD revision")]
    InvalidRevision(#[from] SourceRevisionParseError),
}

fn fmt_exit_code(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_owned(),
    }
}

/// An error returned when the format of a package archive cannot be determined from its name.
#[derive(Clone, Debug, Error)]
#[error(
    "could not determine archive format from file name `{file_name}` (supported formats: {})",
    crate::package::ArchiveFormat::SUPPORTED_FORMATS.iter().map(|(ext, _)| *ext).join(", "),
)]
pub struct UnknownArchiveFormat {
    /// The name of the archive file without any leading components.
    pub file_name: String,
}

/// An error that occurs while extracting a submission package.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackageExtractError {
    /// The archive format could not be determined.
    #[error(transparent)]
    UnknownFormat(#[from] UnknownArchiveFormat),

    /// The archive could not be opened or read.
    #[error("error reading archive `{archive}`")]
    Read {
        /// The archive file.
        archive: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The destination directory could not be created.
    #[error("failed to create destination directory `{dir}`")]
    DestDirCreate {
        /// The destination directory.
        dir: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// An entry's path is not valid UTF-8.
    #[error("archive entry path is not valid UTF-8: {}", String::from_utf8_lossy(.0))]
    NonUtf8Path(Vec<u8>),

    /// An entry's path contains a component that isn't a plain file or directory name.
    #[error("archive entry `{path}` contains an invalid component `{component}`")]
    InvalidComponent {
        /// The entry path.
        path: Utf8PathBuf,
        /// The offending component.
        component: String,
    },

    /// An entry could not be written to disk.
    #[error("error writing extracted file `{path}`")]
    WriteFile {
        /// The entry path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: std::io::Error,
    },
}

/// An error that occurs while scanning an extracted package for result logs.
#[derive(Debug, Error)]
pub enum PackageLayoutError {
    /// Walking the directory failed.
    #[error("error scanning package directory `{dir}`")]
    Walk {
        /// The package directory.
        dir: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: walkdir::Error,
    },

    /// A path within the package is not valid UTF-8.
    #[error("path within package is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

/// A problem with the name of a submission package.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SubmissionNameError {
    /// A submission id was required, but the name has no dash.
    #[error("Submission id should be followed by a dash.")]
    MissingSubmissionId,

    /// The API or API version in the name is not recognized.
    #[error(
        "Incorrect package name: {file_name}. The file should be named as \
         <API><API version>_<Adopter>_<Info>.tgz. See the README for more info."
    )]
    IncorrectName {
        /// The package file name.
        file_name: String,
    },
}

/// A problem with the set of fractional logs under one key.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FractionSetError {
    /// Some logs have a fraction suffix and some don't.
    #[error("some test logs have a fraction suffix and some don't")]
    MixedSuffixes,

    /// The logs disagree on the number of fractions.
    #[error("test logs disagree on the number of fractions ({})", .totals.iter().join(", "))]
    InconsistentTotal {
        /// The distinct totals found.
        totals: Vec<usize>,
    },

    /// The fraction indexes are not exactly `1..=total`.
    #[error("expected fractions 1 to {total}, found {}", .indexes.iter().join(", "))]
    IncompleteSet {
        /// The number of fractions the logs declare.
        total: usize,
        /// The fraction indexes found, in order.
        indexes: Vec<usize>,
    },
}

/// An error that occurs while determining the release a package was built from.
#[derive(Debug, Error)]
pub enum ReleaseTagError {
    /// The git log could not be read.
    #[error("Failed to read `{path}`")]
    Read {
        /// The path to the git log.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The git log names no supported release.
    #[error("No supported release tag found in `{path}`")]
    NotFound {
        /// The path to the git log.
        path: Utf8PathBuf,
    },

    /// The package was built from a withdrawn release.
    #[error("Release {tag} is a withdrawn release")]
    Withdrawn {
        /// The release tag.
        tag: String,
    },
}

/// An error that occurs while writing a rendered report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// An I/O error occurred.
    #[error("error writing report")]
    Io(#[from] std::io::Error),

    /// An error occurred while serializing the JSON summary.
    #[error("error serializing report as JSON")]
    Json(#[from] serde_json::Error),

    /// An error occurred while serializing the JUnit report.
    #[error("error serializing report as JUnit XML")]
    Junit(#[from] quick_junit::SerializeError),
}

/// Displays an error followed by each of its sources, separated by `: `.
pub struct DisplayErrorChain<E>(E);

impl<E: std::error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: std::error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        let mut next = self.0.source();
        while let Some(err) = next {
            write!(f, ": {err}")?;
            next = err.source();
        }

        Ok(())
    }
}
