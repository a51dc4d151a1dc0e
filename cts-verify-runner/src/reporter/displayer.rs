// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{EntryKind, Report, junit::to_junit_report};
use crate::errors::WriteReportError;
use camino::Utf8Path;
use owo_colors::{OwoColorize, Style};
use std::{fmt, io::Write, str::FromStr};

/// The format a [`Report`] is written in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReportFormat {
    /// Human-readable text, grouped by section.
    #[default]
    Human,
    /// A JSON document in the `ReportSummary` format.
    Json,
    /// JUnit XML, with one test suite per section.
    Junit,
}

impl ReportFormat {
    /// The possible string values of this enum.
    pub const VARIANTS: &'static [&'static str] = &["human", "json", "junit"];

    /// Infers the format from an output file's extension.
    ///
    /// `.json` maps to JSON and `.xml` to JUnit. Anything else is rendered as human-readable text.
    pub fn from_path_extension(path: &Utf8Path) -> Self {
        match path.extension().map(|ext| ext.to_ascii_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("xml") => Self::Junit,
            _ => Self::Human,
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "junit" => Ok(Self::Junit),
            other => Err(format!(
                "unknown report format `{other}` (known formats: {})",
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
            Self::Junit => write!(f, "junit"),
        }
    }
}

/// Styles for human-readable output. Uncolored by default.
#[derive(Clone, Debug, Default)]
pub struct ReportStyles {
    title: Style,
    section: Style,
    passed: Style,
    failure: Style,
    warning: Style,
    context: Style,
}

impl ReportStyles {
    /// Enables colors.
    pub fn colorize(&mut self) {
        self.title = Style::new().bold();
        self.section = Style::new().blue().bold();
        self.passed = Style::new().green().bold();
        self.failure = Style::new().red().bold();
        self.warning = Style::new().yellow().bold();
        self.context = Style::new().dimmed();
    }

    fn for_kind(&self, kind: EntryKind) -> Style {
        match kind {
            EntryKind::Message => Style::new(),
            EntryKind::Passed => self.passed,
            EntryKind::Failure => self.failure,
            EntryKind::Warning => self.warning,
        }
    }
}

/// Writes `report` to `writer` in the given format.
pub fn write_report(
    report: &Report,
    format: ReportFormat,
    styles: &ReportStyles,
    mut writer: impl Write,
) -> Result<(), WriteReportError> {
    match format {
        ReportFormat::Human => write_human(report, styles, &mut writer)?,
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &report.to_summary())?;
            writeln!(writer)?;
        }
        ReportFormat::Junit => to_junit_report(report).serialize(&mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn write_human(
    report: &Report,
    styles: &ReportStyles,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    match report.submission_id() {
        Some(id) => writeln!(
            writer,
            "{}",
            format!("Verification report for submission {id}").style(styles.title)
        )?,
        None => writeln!(writer, "{}", "Verification report".style(styles.title))?,
    }

    for section in report.sections() {
        writeln!(writer)?;
        writeln!(writer, "{}", section.title().style(styles.section))?;
        for entry in section.entries() {
            write!(
                writer,
                "  {:>7} {}",
                entry.kind.style(styles.for_kind(entry.kind)),
                entry.text
            )?;
            if let Some(context) = &entry.context {
                write!(writer, " {}", format!("({context})").style(styles.context))?;
            }
            writeln!(writer)?;
        }
    }

    writeln!(writer)?;
    let verdict = if report.has_failures() {
        "FAILED".style(styles.failure)
    } else {
        "PASSED".style(styles.passed)
    };
    writeln!(
        writer,
        "Verification {verdict}: {} passed, {} failures, {} warnings",
        report.passed_count(),
        report.failure_count(),
        report.warning_count(),
    )
}
