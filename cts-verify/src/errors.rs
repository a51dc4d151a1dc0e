// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use cts_verify_metadata::VerifyExitCode;
use cts_verify_runner::errors::*;
use owo_colors::OwoColorize;
use std::{error::Error, path::PathBuf};
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are printed with display_to_stderr, which
// colorizes them and prints the full chain of causes.

/// A setup failure that stops verification before any report is produced.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("current directory is invalid")]
    CurrentDirInvalid { err: std::io::Error },
    #[error("current directory is not valid UTF-8")]
    CurrentDirNotUtf8 { path: PathBuf },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("source tree unavailable")]
    SourceUnavailable {
        #[from]
        err: SourceError,
    },
    #[error("invalid package path")]
    InvalidPackagePath { path: Utf8PathBuf },
    #[error("failed to create temporary directory")]
    TempDirCreate { err: std::io::Error },
    #[error("package extraction failed")]
    PackageExtract {
        package: Utf8PathBuf,
        #[source]
        err: PackageExtractError,
    },
    #[error("failed to write report")]
    WriteReport {
        path: Option<Utf8PathBuf>,
        #[source]
        err: WriteReportError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirInvalid { .. }
            | Self::CurrentDirNotUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::InvalidPackagePath { .. }
            | Self::TempDirCreate { .. } => VerifyExitCode::SETUP_ERROR,
            Self::SourceUnavailable { .. } => VerifyExitCode::SOURCE_UNAVAILABLE,
            Self::PackageExtract { .. } => VerifyExitCode::PACKAGE_EXTRACT_FAILED,
            Self::WriteReport { .. } => VerifyExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr, followed by its causes.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirInvalid { err } => {
                tracing::error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirNotUtf8 { path } => {
                tracing::error!(
                    "current directory `{}` is not valid UTF-8",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::SourceUnavailable { err } => {
                tracing::error!("reference source tree is unavailable, verification will now stop");
                Some(err as &dyn Error)
            }
            Self::InvalidPackagePath { path } => {
                tracing::error!(
                    "package path `{}` does not name a file",
                    path.style(styles.bold)
                );
                None
            }
            Self::TempDirCreate { err } => {
                tracing::error!("failed to create a temporary directory for the package");
                Some(err as &dyn Error)
            }
            Self::PackageExtract { package, err } => {
                tracing::error!("failed to unpack `{}`", package.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::WriteReport { path, err } => {
                match path {
                    Some(path) => {
                        tracing::error!("failed to write report to `{}`", path.style(styles.bold))
                    }
                    None => tracing::error!("failed to write report to stdout"),
                }
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
