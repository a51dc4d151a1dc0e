// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciling the result logs of one submission key against the mustpass lists.
//!
//! A key with a single log is checked in *single-log mode*: the log's results must match the full
//! mustpass list exactly, in count and in order. A key with several logs is a fractional run: each
//! log must independently satisfy the fraction mustpass, and the logs are then merged (fraction
//! cases counted once) and checked against the full mustpass list.

use crate::{
    errors::DisplayErrorChain,
    integrity::{SourceRevision, verify_file_integrity},
    log_parser::{LogReader, TestCaseResult, TestLog},
    mustpass::Mustpass,
    reporter::ReportSink,
    validate::validate_case_presence,
};
use camino::{Utf8Path, Utf8PathBuf};

/// The verdict for one submission key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyVerdict {
    /// The key.
    pub key: String,
    /// The number of log files under the key.
    pub file_count: usize,
    /// True if any failure was reported for this key.
    pub any_error: bool,
    /// True if results were found in mustpass order.
    pub order_ok: bool,
}

impl KeyVerdict {
    fn new(key: &str, file_count: usize) -> Self {
        Self {
            key: key.to_owned(),
            file_count,
            any_error: false,
            order_ok: true,
        }
    }

    /// A verdict for a key that could not be checked.
    pub(crate) fn skipped(key: &str, file_count: usize) -> Self {
        Self {
            any_error: true,
            ..Self::new(key, file_count)
        }
    }
}

/// The verdicts for every key of a package.
#[derive(Clone, Debug, Default)]
pub struct PackageVerdict {
    keys: Vec<KeyVerdict>,
}

impl PackageVerdict {
    /// Creates an empty verdict.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the verdict for a key.
    pub fn push(&mut self, verdict: KeyVerdict) {
        self.keys.push(verdict);
    }

    /// Returns the per-key verdicts, in reconciliation order.
    pub fn keys(&self) -> &[KeyVerdict] {
        &self.keys
    }

    /// Returns true if any key had an error.
    pub fn any_error(&self) -> bool {
        self.keys.iter().any(|key| key.any_error)
    }
}

/// Reconciles result logs against mustpass lists.
pub struct Reconciler<'a> {
    reader: &'a dyn LogReader,
    revision: &'a SourceRevision,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler that reads logs with `reader` and checks them against `revision`.
    pub fn new(reader: &'a dyn LogReader, revision: &'a SourceRevision) -> Self {
        Self { reader, revision }
    }

    /// Reconciles the logs of one key. `files` are relative to `base`, in fraction order.
    ///
    /// A single file is checked in single-log mode. Several files are checked in fraction mode,
    /// which requires `fraction`; without it, the per-file fraction checks are skipped and a
    /// failure is reported.
    pub fn reconcile_key(
        &self,
        sink: &mut dyn ReportSink,
        key: &str,
        base: &Utf8Path,
        files: &[Utf8PathBuf],
        mustpass: &Mustpass,
        fraction: Option<&Mustpass>,
    ) -> KeyVerdict {
        match files {
            [] => {
                sink.failure("No test logs found", Some(key));
                KeyVerdict::skipped(key, 0)
            }
            [file] => self.reconcile_single(sink, key, base, file, mustpass),
            _ => self.reconcile_fractions(sink, key, base, files, mustpass, fraction),
        }
    }

    /// Checks every file of a key individually in single-log mode, combining the verdicts.
    pub fn reconcile_each(
        &self,
        sink: &mut dyn ReportSink,
        key: &str,
        base: &Utf8Path,
        files: &[Utf8PathBuf],
        mustpass: &Mustpass,
    ) -> KeyVerdict {
        let mut verdict = KeyVerdict::new(key, files.len());
        for file in files {
            let file_verdict = self.reconcile_single(sink, key, base, file, mustpass);
            verdict.any_error |= file_verdict.any_error;
            verdict.order_ok &= file_verdict.order_ok;
        }
        verdict
    }

    /// Checks one log against the full mustpass list.
    pub fn reconcile_single(
        &self,
        sink: &mut dyn ReportSink,
        key: &str,
        base: &Utf8Path,
        file: &Utf8Path,
        mustpass: &Mustpass,
    ) -> KeyVerdict {
        let mut verdict = KeyVerdict::new(key, 1);
        let context = Some(file.as_str());

        let Some(log) = self.read(sink, base, file) else {
            verdict.any_error = true;
            summarize(sink, mustpass, true, context);
            return verdict;
        };

        verdict.any_error |=
            verify_file_integrity(sink, file.as_str(), log.session_info(), self.revision);

        let results = log.results();
        let counts_match = check_count(sink, mustpass, results.len(), context);
        verdict.any_error |= !counts_match;

        let outcome = validate_case_presence(sink, mustpass, results, context);
        verdict.any_error |= outcome.any_error;
        verdict.order_ok = outcome.order_ok;

        if counts_match && !outcome.order_ok {
            sink.failure("Results are not in the expected order", context);
            verdict.any_error = true;
        }

        summarize(sink, mustpass, verdict.any_error, context);
        verdict
    }

    fn reconcile_fractions(
        &self,
        sink: &mut dyn ReportSink,
        key: &str,
        base: &Utf8Path,
        files: &[Utf8PathBuf],
        mustpass: &Mustpass,
        fraction: Option<&Mustpass>,
    ) -> KeyVerdict {
        let mut verdict = KeyVerdict::new(key, files.len());

        if fraction.is_none() {
            sink.failure(
                "Fraction mustpass is not available, per-file fraction checks are skipped",
                Some(key),
            );
            verdict.any_error = true;
        }

        let mut per_file = Vec::with_capacity(files.len());
        for file in files {
            let context = Some(file.as_str());
            let Some(log) = self.read(sink, base, file) else {
                verdict.any_error = true;
                continue;
            };

            let mut file_error =
                verify_file_integrity(sink, file.as_str(), log.session_info(), self.revision);

            if let Some(fraction) = fraction {
                sink.message(&format!("Verifying {} results.", fraction.name()), context);
                let outcome = validate_case_presence(sink, fraction, log.results(), context);
                file_error |= outcome.any_error;
                summarize(sink, fraction, file_error, context);
            }

            verdict.any_error |= file_error;
            per_file.push(log.into_results());
        }

        let merged = merge_fraction_results(fraction, per_file);

        let context = Some(key);
        sink.message(&format!("Verifying {} results.", mustpass.name()), context);
        verdict.any_error |= !check_count(sink, mustpass, merged.len(), context);

        let outcome = validate_case_presence(sink, mustpass, &merged, context);
        verdict.any_error |= outcome.any_error;
        verdict.order_ok = outcome.order_ok;

        summarize(sink, mustpass, verdict.any_error, context);
        verdict
    }

    fn read(&self, sink: &mut dyn ReportSink, base: &Utf8Path, file: &Utf8Path) -> Option<TestLog> {
        sink.message("Reading results.", Some(file.as_str()));
        match self.reader.read_log(&base.join(file)) {
            Ok(log) => Some(log),
            Err(err) => {
                sink.failure(
                    &format!("Failed to read test log: {}", DisplayErrorChain::new(&err)),
                    Some(file.as_str()),
                );
                None
            }
        }
    }
}

/// Merges the results of a fractional run.
///
/// The first log's results are taken in full. Later logs contribute only the cases not in
/// `fraction`, since every log repeats the fraction cases. With no fraction list, logs are simply
/// concatenated.
pub fn merge_fraction_results(
    fraction: Option<&Mustpass>,
    per_file: Vec<Vec<TestCaseResult>>,
) -> Vec<TestCaseResult> {
    let mut per_file = per_file.into_iter();
    let mut merged = per_file.next().unwrap_or_default();
    for results in per_file {
        merged.extend(
            results
                .into_iter()
                .filter(|result| !fraction.is_some_and(|fraction| fraction.contains(&result.name))),
        );
    }
    merged
}

fn check_count(
    sink: &mut dyn ReportSink,
    mustpass: &Mustpass,
    found: usize,
    context: Option<&str>,
) -> bool {
    if found == mustpass.len() {
        return true;
    }
    sink.failure(
        &format!(
            "Wrong number of test results, expected {}, found {found}",
            mustpass.len()
        ),
        context,
    );
    false
}

fn summarize(sink: &mut dyn ReportSink, mustpass: &Mustpass, any_error: bool, context: Option<&str>) {
    if any_error {
        sink.failure(&format!("Verification of {} results FAILED", mustpass.name()), context);
    } else {
        sink.passed(&format!("Verification of {} results PASSED", mustpass.name()), context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::LogReadError,
        integrity::{RELEASE_ID_KEY, RELEASE_NAME_KEY},
        reporter::{EntryKind, Report},
        status::StatusCode,
    };
    use maplit::btreemap;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const REVISION: &str = "0123456789abcdef0123456789abcdef01234567";

    #[derive(Default)]
    struct MemoryReader {
        logs: HashMap<Utf8PathBuf, TestLog>,
    }

    impl MemoryReader {
        fn add(&mut self, path: &str, cases: &[&str]) {
            let results = cases
                .iter()
                .map(|case| TestCaseResult::new(*case, StatusCode::Pass))
                .collect();
            let session_info = btreemap! {
                RELEASE_NAME_KEY.to_owned() => format!("git-{REVISION}"),
                RELEASE_ID_KEY.to_owned() => "0x01234567".to_owned(),
            };
            self.logs.insert(
                Utf8PathBuf::from("base").join(path),
                TestLog::new(results, session_info),
            );
        }
    }

    impl LogReader for MemoryReader {
        fn read_log(&self, path: &Utf8Path) -> Result<TestLog, LogReadError> {
            self.logs.get(path).cloned().ok_or_else(|| {
                LogReadError::new(path, std::io::Error::from(std::io::ErrorKind::NotFound))
            })
        }
    }

    fn mustpass(name: &str, cases: &[&str]) -> Mustpass {
        Mustpass::from_cases(name, cases.iter().copied()).unwrap()
    }

    fn failures(report: &Report) -> Vec<String> {
        report
            .entries()
            .filter(|entry| entry.kind == EntryKind::Failure)
            .map(|entry| entry.text.clone())
            .collect()
    }

    fn files(names: &[&str]) -> Vec<Utf8PathBuf> {
        names.iter().map(Utf8PathBuf::from).collect()
    }

    #[test]
    fn single_log_passes() {
        let mut reader = MemoryReader::default();
        reader.add("vk.qpa", &["A", "B", "C"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_key(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            &files(&["vk.qpa"]),
            &mustpass("vk-default.txt", &["A", "B", "C"]),
            None,
        );

        assert_eq!(failures(&report), Vec::<String>::new());
        assert!(!verdict.any_error);
        assert!(verdict.order_ok);
        assert_eq!(
            report.entries().last().unwrap().text,
            "Verification of vk-default.txt results PASSED"
        );
    }

    #[test]
    fn single_log_reordered_is_a_failure() {
        let mut reader = MemoryReader::default();
        reader.add("vk.qpa", &["C", "A", "B"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_single(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            Utf8Path::new("vk.qpa"),
            &mustpass("vk-default.txt", &["A", "B", "C"]),
        );

        assert!(verdict.any_error);
        assert!(!verdict.order_ok);
        assert_eq!(
            failures(&report),
            vec![
                "Results are not in the expected order",
                "Verification of vk-default.txt results FAILED",
            ]
        );
    }

    #[test]
    fn single_log_extra_case_is_a_count_mismatch() {
        let mut reader = MemoryReader::default();
        reader.add("vk.qpa", &["A", "B", "X"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_single(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            Utf8Path::new("vk.qpa"),
            &mustpass("vk-default.txt", &["A", "B"]),
        );

        assert!(verdict.any_error);
        assert_eq!(
            failures(&report),
            vec![
                "Wrong number of test results, expected 2, found 3",
                "Verification of vk-default.txt results FAILED",
            ]
        );
    }

    #[test]
    fn merge_drops_repeated_fraction_cases() {
        let fraction = mustpass("vk-fraction-mandatory-tests.txt", &["frac1", "frac2"]);
        let file = |cases: &[&str]| -> Vec<TestCaseResult> {
            cases
                .iter()
                .map(|case| TestCaseResult::new(*case, StatusCode::Pass))
                .collect()
        };

        let merged = merge_fraction_results(
            Some(&fraction),
            vec![
                file(&["frac1", "frac2", "other1"]),
                file(&["frac1", "frac2", "other2"]),
            ],
        );
        let names: Vec<_> = merged.iter().map(|result| result.name.as_str()).collect();
        assert_eq!(names, vec!["frac1", "frac2", "other1", "other2"]);

        let concatenated = merge_fraction_results(None, vec![file(&["a"]), file(&["a", "b"])]);
        assert_eq!(concatenated.len(), 3);
        assert!(merge_fraction_results(Some(&fraction), Vec::new()).is_empty());
    }

    #[test]
    fn fractions_pass() {
        let mut reader = MemoryReader::default();
        reader.add("vk-1-of-2.qpa", &["frac1", "frac2", "other1"]);
        reader.add("vk-2-of-2.qpa", &["frac1", "frac2", "other2"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let fraction = mustpass("vk-fraction-mandatory-tests.txt", &["frac1", "frac2"]);
        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_key(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            &files(&["vk-1-of-2.qpa", "vk-2-of-2.qpa"]),
            &mustpass("vk-default.txt", &["frac1", "frac2", "other1", "other2"]),
            Some(&fraction),
        );

        assert_eq!(failures(&report), Vec::<String>::new());
        assert!(!verdict.any_error);
        assert_eq!(verdict.file_count, 2);

        let passed: Vec<_> = report
            .entries()
            .filter(|entry| entry.kind == EntryKind::Passed)
            .filter(|entry| entry.text.starts_with("Verification of"))
            .map(|entry| (entry.text.as_str(), entry.context.as_deref()))
            .collect();
        assert_eq!(
            passed,
            vec![
                (
                    "Verification of vk-fraction-mandatory-tests.txt results PASSED",
                    Some("vk-1-of-2.qpa")
                ),
                (
                    "Verification of vk-fraction-mandatory-tests.txt results PASSED",
                    Some("vk-2-of-2.qpa")
                ),
                ("Verification of vk-default.txt results PASSED", Some("vk")),
            ]
        );
    }

    #[test]
    fn fraction_missing_in_second_file() {
        let mut reader = MemoryReader::default();
        reader.add("vk-1-of-2.qpa", &["frac1", "frac2", "other1"]);
        reader.add("vk-2-of-2.qpa", &["frac1", "other2"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let fraction = mustpass("vk-fraction-mandatory-tests.txt", &["frac1", "frac2"]);
        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_key(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            &files(&["vk-1-of-2.qpa", "vk-2-of-2.qpa"]),
            &mustpass("vk-default.txt", &["frac1", "frac2", "other1", "other2"]),
            Some(&fraction),
        );

        assert!(verdict.any_error);
        assert_eq!(
            failures(&report),
            vec![
                "Missing result for frac2",
                "Verification of vk-fraction-mandatory-tests.txt results FAILED",
                "Verification of vk-default.txt results FAILED",
            ]
        );
    }

    #[test]
    fn fraction_count_mismatch_is_reported_first() {
        let mut reader = MemoryReader::default();
        reader.add("vk-1-of-2.qpa", &["frac1", "other1"]);
        reader.add("vk-2-of-2.qpa", &["frac1"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let fraction = mustpass("vk-fraction-mandatory-tests.txt", &["frac1"]);
        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_key(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            &files(&["vk-1-of-2.qpa", "vk-2-of-2.qpa"]),
            &mustpass("vk-default.txt", &["frac1", "other1", "other2"]),
            Some(&fraction),
        );

        assert!(verdict.any_error);
        assert_eq!(
            failures(&report),
            vec![
                "Wrong number of test results, expected 3, found 2",
                "Missing result for other2",
                "Verification of vk-default.txt results FAILED",
            ]
        );
    }

    #[test]
    fn unreadable_file_is_reported_and_skipped() {
        let mut reader = MemoryReader::default();
        reader.add("vk-1-of-2.qpa", &["frac1", "other1"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let fraction = mustpass("vk-fraction-mandatory-tests.txt", &["frac1"]);
        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_key(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            &files(&["vk-1-of-2.qpa", "vk-2-of-2.qpa"]),
            &mustpass("vk-default.txt", &["frac1", "other1", "other2"]),
            Some(&fraction),
        );

        assert!(verdict.any_error);
        let failures = failures(&report);
        assert!(
            failures[0].starts_with("Failed to read test log: failed to read test log `base/vk-2-of-2.qpa`"),
            "{failures:?}"
        );
        assert!(failures.contains(&"Missing result for other2".to_owned()));
    }

    #[test]
    fn no_fraction_mustpass() {
        let mut reader = MemoryReader::default();
        reader.add("vk-1-of-2.qpa", &["a"]);
        reader.add("vk-2-of-2.qpa", &["b"]);
        let revision: SourceRevision = REVISION.parse().unwrap();
        let reconciler = Reconciler::new(&reader, &revision);

        let mut report = Report::new(None, false);
        let verdict = reconciler.reconcile_key(
            &mut report,
            "vk",
            Utf8Path::new("base"),
            &files(&["vk-1-of-2.qpa", "vk-2-of-2.qpa"]),
            &mustpass("vk-default.txt", &["a", "b"]),
            None,
        );

        assert!(verdict.any_error);
        assert_eq!(
            failures(&report),
            vec![
                "Fraction mustpass is not available, per-file fraction checks are skipped",
                "Verification of vk-default.txt results FAILED",
            ]
        );
    }
}
