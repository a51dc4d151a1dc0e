// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use clap::{Parser, ValueEnum};
use cts_verify_metadata::VerifyExitCode;
use cts_verify_runner::{
    config::VerifyConfig,
    errors::WriteReportError,
    package::{extract_package, parse_submission_id},
    reporter::{Report, ReportFormat, ReportStyles, write_report},
    source::SourceTree,
    verify::Verifier,
};
use std::{fs::File, io::BufWriter};
use tracing::info;

/// Verifies a conformance submission package.
///
/// The package is extracted, the reference source is checked out at the release the package was
/// built from, and every result log is checked against the mustpass lists.
#[derive(Debug, Parser)]
#[command(name = "cts-verify", version, styles = clap_styles::style())]
pub struct CtsVerifyApp {
    /// Path to the package file (.tgz, .tar.gz, .tar.zst or .tar)
    #[arg(value_name = "PACKAGE")]
    package: Utf8PathBuf,

    /// Directory to extract the package to [default: a new temporary directory]
    #[arg(long, short = 'd', value_name = "DIR")]
    untar_dir: Option<Utf8PathBuf>,

    /// Existing checkout of the reference source [default: clone from the configured mirrors]
    #[arg(long, short = 's', value_name = "DIR")]
    source: Option<Utf8PathBuf>,

    /// The package name starts with the submission id, as required for uploaded submissions
    #[arg(long, short = 'k')]
    khronos: bool,

    /// Also write the report to this file
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<Utf8PathBuf>,

    /// Format of the --output file [default: inferred from its extension]
    #[arg(long, value_enum, value_name = "FORMAT", requires = "output")]
    output_format: Option<OutputFormatOpt>,

    /// Config file [default: .config/cts-verify.toml if present]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    #[command(flatten)]
    output_opts: OutputOpts,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormatOpt {
    /// Plain text, as printed to stdout
    Human,
    /// A JSON summary
    Json,
    /// JUnit XML
    Junit,
}

impl From<OutputFormatOpt> for ReportFormat {
    fn from(format: OutputFormatOpt) -> Self {
        match format {
            OutputFormatOpt::Human => ReportFormat::Human,
            OutputFormatOpt::Json => ReportFormat::Json,
            OutputFormatOpt::Junit => ReportFormat::Junit,
        }
    }
}

impl CtsVerifyApp {
    /// Initializes logging and color support.
    pub fn init_output(&self) -> OutputContext {
        self.output_opts.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let cwd = current_dir()?;
        let config = VerifyConfig::from_sources(&cwd, self.config_file.as_deref())?;

        let package_file_name = self
            .package
            .file_name()
            .ok_or_else(|| ExpectedError::InvalidPackagePath {
                path: self.package.clone(),
            })?
            .to_owned();

        let source = self.open_source(&config)?;

        // Keeps a temporary extraction directory alive until verification is done.
        let (package_dir, _temp_dir) = self.package_dir()?;
        info!("unpacking `{}` to `{package_dir}`", self.package);
        let extracted = extract_package(&self.package, &package_dir).map_err(|err| {
            ExpectedError::PackageExtract {
                package: self.package.clone(),
                err,
            }
        })?;
        info!("unpacked {} entries", extracted.entry_count);

        let submission_id = if self.khronos {
            parse_submission_id(&package_file_name)
                .ok()
                .map(|(id, _)| id.to_owned())
        } else {
            None
        };
        let mut report = Report::new(submission_id, output.verbose);

        let mut verifier = Verifier::new(&config, &source, package_file_name, package_dir);
        verifier.set_khronos(self.khronos);
        let verdict = verifier.verify(&mut report);
        report.record_verdicts(&verdict);

        let mut styles = ReportStyles::default();
        if output.should_colorize_stdout() {
            styles.colorize();
        }
        write_report(
            &report,
            ReportFormat::Human,
            &styles,
            output_writer.stdout_writer(),
        )
        .map_err(|err| ExpectedError::WriteReport { path: None, err })?;

        if let Some(path) = &self.output {
            self.write_output_file(&report, path)?;
        }

        Ok(if report.has_failures() {
            VerifyExitCode::VERIFICATION_FAILED
        } else {
            VerifyExitCode::OK
        })
    }

    fn open_source(&self, config: &VerifyConfig) -> Result<SourceTree> {
        if let Some(source) = &self.source {
            return Ok(SourceTree::open(source.clone())?);
        }

        let clone_dir = config.source().clone_dir();
        if clone_dir.join(".git").exists() {
            info!("reusing existing clone at `{clone_dir}`");
            return Ok(SourceTree::open(clone_dir)?);
        }
        Ok(SourceTree::clone_from_mirrors(
            config.source().mirrors(),
            &clone_dir,
        )?)
    }

    fn package_dir(&self) -> Result<(Utf8PathBuf, Option<Utf8TempDir>)> {
        match &self.untar_dir {
            Some(dir) => Ok((dir.clone(), None)),
            None => {
                let temp_dir = camino_tempfile::Builder::new()
                    .prefix("cts-verify-package-")
                    .tempdir()
                    .map_err(|err| ExpectedError::TempDirCreate { err })?;
                Ok((temp_dir.path().to_owned(), Some(temp_dir)))
            }
        }
    }

    fn write_output_file(&self, report: &Report, path: &Utf8Path) -> Result<()> {
        let format = match self.output_format {
            Some(format) => format.into(),
            None => ReportFormat::from_path_extension(path),
        };
        let write_err = |err: WriteReportError| ExpectedError::WriteReport {
            path: Some(path.to_owned()),
            err,
        };

        let file = File::create(path).map_err(|err| write_err(err.into()))?;
        write_report(report, format, &ReportStyles::default(), BufWriter::new(file))
            .map_err(write_err)?;
        info!("wrote {format} report to `{path}`");
        Ok(())
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirInvalid { err })?;
    Utf8PathBuf::try_from(cwd)
        .map_err(|err| ExpectedError::CurrentDirNotUtf8 {
            path: err.into_path_buf(),
        })
}
