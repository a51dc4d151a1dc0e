// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collecting and rendering verification results.
//!
//! Verification steps write pass/fail entries to a [`ReportSink`]. The [`Report`] sink collects
//! them into titled sections, which can then be rendered as text, JSON or JUnit XML.

mod displayer;
mod junit;

pub use displayer::*;

use crate::reconcile::PackageVerdict;
use cts_verify_metadata::{
    EntryKindSummary, KeySummary, ReportEntrySummary, ReportSummary, SectionSummary,
};
use std::fmt;

/// The kind of a report entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntryKind {
    /// Informational.
    Message,
    /// A check passed.
    Passed,
    /// A check failed. Any failure makes the overall verification fail.
    Failure,
    /// A non-fatal anomaly.
    Warning,
}

impl EntryKind {
    /// Returns the label used when rendering this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "MESSAGE",
            Self::Passed => "PASSED",
            Self::Failure => "FAILURE",
            Self::Warning => "WARNING",
        }
    }

    fn to_summary(self) -> EntryKindSummary {
        match self {
            Self::Message => EntryKindSummary::Message,
            Self::Passed => EntryKindSummary::Passed,
            Self::Failure => EntryKindSummary::Failure,
            Self::Warning => EntryKindSummary::Warning,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A destination for verification results.
pub trait ReportSink {
    /// Records an entry. `context` names the file or package the entry is about.
    fn record(&mut self, kind: EntryKind, text: &str, context: Option<&str>);

    /// Starts a new group of entries. Ignored by default.
    fn section(&mut self, title: &str) {
        let _ = title;
    }

    /// Records an informational message.
    fn message(&mut self, text: &str, context: Option<&str>) {
        self.record(EntryKind::Message, text, context);
    }

    /// Records a successful check.
    fn passed(&mut self, text: &str, context: Option<&str>) {
        self.record(EntryKind::Passed, text, context);
    }

    /// Records a failed check.
    fn failure(&mut self, text: &str, context: Option<&str>) {
        self.record(EntryKind::Failure, text, context);
    }

    /// Records a non-fatal anomaly.
    fn warning(&mut self, text: &str, context: Option<&str>) {
        self.record(EntryKind::Warning, text, context);
    }
}

/// A single recorded entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportEntry {
    /// The kind of entry.
    pub kind: EntryKind,
    /// The entry text.
    pub text: String,
    /// The file or package the entry refers to.
    pub context: Option<String>,
}

/// A titled group of entries.
#[derive(Clone, Debug)]
pub struct ReportSection {
    title: String,
    entries: Vec<ReportEntry>,
}

impl ReportSection {
    /// Returns the section title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the entries in this section, in recording order.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }
}

/// A [`ReportSink`] that keeps every entry for later rendering.
#[derive(Clone, Debug)]
pub struct Report {
    submission_id: Option<String>,
    verbose: bool,
    sections: Vec<ReportSection>,
    keys: Vec<KeySummary>,
    passed_count: usize,
    failure_count: usize,
    warning_count: usize,
}

impl Report {
    /// The title of the section entries go to before any subtitle is set.
    pub const DEFAULT_SECTION: &'static str = "General";

    /// Creates a new, empty report.
    ///
    /// If `verbose` is true, each entry is also logged as it is recorded.
    pub fn new(submission_id: Option<String>, verbose: bool) -> Self {
        Self {
            submission_id,
            verbose,
            sections: Vec::new(),
            keys: Vec::new(),
            passed_count: 0,
            failure_count: 0,
            warning_count: 0,
        }
    }

    /// Sets the submission id shown in the report title.
    pub fn set_submission_id(&mut self, submission_id: Option<String>) {
        self.submission_id = submission_id;
    }

    /// Returns the submission id, if any.
    pub fn submission_id(&self) -> Option<&str> {
        self.submission_id.as_deref()
    }

    /// Starts a new section. Subsequent entries are recorded under it.
    pub fn subtitle(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.verbose {
            tracing::info!(target: "cts_verify_runner::report", "== {title} ==");
        }
        self.sections.push(ReportSection {
            title,
            entries: Vec::new(),
        });
    }

    /// Records the per-key verdicts of a reconciliation pass.
    pub fn record_verdicts(&mut self, verdict: &PackageVerdict) {
        self.keys.extend(verdict.keys().iter().map(|key| KeySummary {
            key: key.key.clone(),
            file_count: key.file_count,
            any_error: key.any_error,
            order_ok: key.order_ok,
        }));
    }

    /// Returns the sections of this report.
    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Iterates over all entries across sections.
    pub fn entries(&self) -> impl Iterator<Item = &ReportEntry> + '_ {
        self.sections.iter().flat_map(|section| section.entries.iter())
    }

    /// Returns the number of passed checks.
    pub fn passed_count(&self) -> usize {
        self.passed_count
    }

    /// Returns the number of failures.
    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    /// Returns the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Returns true if any failure was recorded.
    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }

    /// Converts this report into its serializable form.
    pub fn to_summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::new(self.submission_id.clone());
        summary.sections = self
            .sections
            .iter()
            .map(|section| SectionSummary {
                title: section.title.clone(),
                entries: section
                    .entries
                    .iter()
                    .map(|entry| ReportEntrySummary {
                        kind: entry.kind.to_summary(),
                        text: entry.text.clone(),
                        context: entry.context.clone(),
                    })
                    .collect(),
            })
            .collect();
        summary.keys = self.keys.clone();
        summary.failure_count = self.failure_count;
        summary.warning_count = self.warning_count;
        summary
    }

    fn current_section(&mut self) -> &mut ReportSection {
        if self.sections.is_empty() {
            self.sections.push(ReportSection {
                title: Self::DEFAULT_SECTION.to_owned(),
                entries: Vec::new(),
            });
        }
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }
}

impl ReportSink for Report {
    fn section(&mut self, title: &str) {
        self.subtitle(title);
    }

    fn record(&mut self, kind: EntryKind, text: &str, context: Option<&str>) {
        match kind {
            EntryKind::Message => {}
            EntryKind::Passed => self.passed_count += 1,
            EntryKind::Failure => self.failure_count += 1,
            EntryKind::Warning => self.warning_count += 1,
        }

        if self.verbose {
            match context {
                Some(context) => {
                    tracing::info!(target: "cts_verify_runner::report", "{kind:>8} {text} ({context})")
                }
                None => tracing::info!(target: "cts_verify_runner::report", "{kind:>8} {text}"),
            }
        }

        self.current_section().entries.push(ReportEntry {
            kind,
            text: text.to_owned(),
            context: context.map(str::to_owned),
        });
    }
}
