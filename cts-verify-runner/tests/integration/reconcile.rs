// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino::Utf8PathBuf;
use cts_verify_runner::{
    log_parser::BatchLogParser,
    mustpass::Mustpass,
    reconcile::Reconciler,
    reporter::{EntryKind, Report},
    validate::MAX_REPORTED_MISSING,
};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn mustpass(cases: &[&str]) -> Mustpass {
    Mustpass::from_cases("vk-default.txt", cases.iter().copied()).unwrap()
}

#[test]
fn single_log_in_order_passes() {
    let dir = temp_dir("cts-verify-reconcile-");
    write_file(
        &dir.path().join("TestResults.qpa"),
        &passing_qpa(&["dEQP-VK.a", "dEQP-VK.b", "dEQP-VK.c"]),
    );

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[Utf8PathBuf::from("TestResults.qpa")],
        &mustpass(&["dEQP-VK.a", "dEQP-VK.b", "dEQP-VK.c"]),
        None,
    );

    assert!(!verdict.any_error);
    assert!(verdict.order_ok);
    assert!(!report.has_failures());
    assert_eq!(
        texts(&report, EntryKind::Passed).last().copied(),
        Some("Verification of vk-default.txt results PASSED")
    );
}

#[test]
fn reordered_results_fail_on_order() {
    let dir = temp_dir("cts-verify-reconcile-");
    write_file(
        &dir.path().join("TestResults.qpa"),
        &passing_qpa(&["dEQP-VK.b", "dEQP-VK.a", "dEQP-VK.c"]),
    );

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[Utf8PathBuf::from("TestResults.qpa")],
        &mustpass(&["dEQP-VK.a", "dEQP-VK.b", "dEQP-VK.c"]),
        None,
    );

    assert!(verdict.any_error);
    assert!(!verdict.order_ok);
    assert_eq!(
        texts(&report, EntryKind::Failure),
        vec![
            "Results are not in the expected order",
            "Verification of vk-default.txt results FAILED",
        ]
    );
}

#[test]
fn missing_result_is_reported() {
    let dir = temp_dir("cts-verify-reconcile-");
    write_file(
        &dir.path().join("TestResults.qpa"),
        &passing_qpa(&["dEQP-VK.a", "dEQP-VK.c"]),
    );

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[Utf8PathBuf::from("TestResults.qpa")],
        &mustpass(&["dEQP-VK.a", "dEQP-VK.b", "dEQP-VK.c"]),
        None,
    );

    assert!(verdict.any_error);
    assert_eq!(
        texts(&report, EntryKind::Failure),
        vec![
            "Wrong number of test results, expected 3, found 2",
            "Missing result for dEQP-VK.b",
            "Verification of vk-default.txt results FAILED",
        ]
    );
}

#[test_case("Fail", true ; "fail is disallowed")]
#[test_case("Pass", false ; "pass is allowed")]
#[test_case("Waiver", false ; "waiver is allowed")]
#[test_case("NotSupported", false ; "not supported is allowed")]
#[test_case("Crash", true ; "crash is disallowed")]
fn status_of_single_case(status: &str, expect_error: bool) {
    let dir = temp_dir("cts-verify-reconcile-");
    write_file(
        &dir.path().join("TestResults.qpa"),
        &qpa(
            &format!("git-{REVISION}"),
            "0x01234567",
            &[("dEQP-VK.a", status)],
        ),
    );

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[Utf8PathBuf::from("TestResults.qpa")],
        &mustpass(&["dEQP-VK.a"]),
        None,
    );

    assert_eq!(verdict.any_error, expect_error);
    if expect_error {
        assert_eq!(
            texts(&report, EntryKind::Failure).first().copied(),
            Some(format!("dEQP-VK.a: {status}").as_str())
        );
    }
}

#[test]
fn missing_results_are_capped() {
    let all: Vec<String> = (0..40).map(|i| format!("dEQP-VK.case{i:02}")).collect();
    let present: Vec<&str> = all[..10].iter().map(String::as_str).collect();

    let dir = temp_dir("cts-verify-reconcile-");
    write_file(&dir.path().join("TestResults.qpa"), &passing_qpa(&present));

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[Utf8PathBuf::from("TestResults.qpa")],
        &Mustpass::from_cases("vk-default.txt", all.iter().cloned()).unwrap(),
        None,
    );

    assert!(verdict.any_error);
    let missing: Vec<_> = texts(&report, EntryKind::Failure)
        .into_iter()
        .filter(|text| text.starts_with("Missing result for "))
        .collect();
    assert_eq!(missing.len(), MAX_REPORTED_MISSING);
    assert_eq!(missing[0], "Missing result for dEQP-VK.case10");
    assert!(
        texts(&report, EntryKind::Message)
            .contains(&"10 more missing results found but only the first 20 are reported")
    );
}

#[test]
fn fraction_logs_are_merged() {
    let dir = temp_dir("cts-verify-reconcile-");
    // Every fraction repeats the fraction mandatory cases.
    write_file(
        &dir.path().join("TestResults-1-of-2.qpa"),
        &passing_qpa(&["dEQP-VK.mandatory", "dEQP-VK.a", "dEQP-VK.b"]),
    );
    write_file(
        &dir.path().join("TestResults-2-of-2.qpa"),
        &passing_qpa(&["dEQP-VK.mandatory", "dEQP-VK.c"]),
    );

    let full = mustpass(&["dEQP-VK.mandatory", "dEQP-VK.a", "dEQP-VK.b", "dEQP-VK.c"]);
    let fraction =
        Mustpass::from_cases("vk-fraction-mandatory-tests.txt", ["dEQP-VK.mandatory"]).unwrap();

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[
            Utf8PathBuf::from("TestResults-1-of-2.qpa"),
            Utf8PathBuf::from("TestResults-2-of-2.qpa"),
        ],
        &full,
        Some(&fraction),
    );

    assert!(!verdict.any_error, "failures: {:?}", texts(&report, EntryKind::Failure));
    assert_eq!(verdict.file_count, 2);
    assert_eq!(
        texts(&report, EntryKind::Passed)
            .into_iter()
            .filter(|text| text.starts_with("Verification of"))
            .collect::<Vec<_>>(),
        vec![
            "Verification of vk-fraction-mandatory-tests.txt results PASSED",
            "Verification of vk-fraction-mandatory-tests.txt results PASSED",
            "Verification of vk-default.txt results PASSED",
        ]
    );
}

#[test]
fn fraction_missing_mandatory_case_fails() {
    let dir = temp_dir("cts-verify-reconcile-");
    write_file(
        &dir.path().join("TestResults-1-of-2.qpa"),
        &passing_qpa(&["dEQP-VK.mandatory", "dEQP-VK.a"]),
    );
    write_file(
        &dir.path().join("TestResults-2-of-2.qpa"),
        &passing_qpa(&["dEQP-VK.b"]),
    );

    let full = mustpass(&["dEQP-VK.mandatory", "dEQP-VK.a", "dEQP-VK.b"]);
    let fraction =
        Mustpass::from_cases("vk-fraction-mandatory-tests.txt", ["dEQP-VK.mandatory"]).unwrap();

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[
            Utf8PathBuf::from("TestResults-1-of-2.qpa"),
            Utf8PathBuf::from("TestResults-2-of-2.qpa"),
        ],
        &full,
        Some(&fraction),
    );

    assert!(verdict.any_error);
    assert_eq!(
        texts(&report, EntryKind::Failure),
        vec![
            "Missing result for dEQP-VK.mandatory",
            "Verification of vk-fraction-mandatory-tests.txt results FAILED",
            "Verification of vk-default.txt results FAILED",
        ]
    );
}

#[test]
fn integrity_mismatch_reports_both_fields() {
    let dir = temp_dir("cts-verify-reconcile-");
    write_file(
        &dir.path().join("TestResults.qpa"),
        &qpa("git-ffffffffffffffff", "0xffffffff", &[("dEQP-VK.a", "Pass")]),
    );

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[Utf8PathBuf::from("TestResults.qpa")],
        &mustpass(&["dEQP-VK.a"]),
        None,
    );

    assert!(verdict.any_error);
    let failures = texts(&report, EntryKind::Failure);
    assert_eq!(failures.len(), 3, "failures: {failures:?}");
    assert!(failures[0].starts_with("Test log releaseName doesn't match"));
    assert!(failures[1].starts_with("Test log releaseId doesn't match"));
    assert_eq!(failures[2], "Verification of vk-default.txt results FAILED");
}

#[test]
fn extra_case_is_a_count_mismatch() {
    let dir = temp_dir("cts-verify-reconcile-");
    write_file(
        &dir.path().join("TestResults.qpa"),
        &passing_qpa(&["dEQP-VK.a", "dEQP-VK.b", "dEQP-VK.extra"]),
    );

    let parser = BatchLogParser::new();
    let revision = revision();
    let mut report = Report::new(None, false);
    let verdict = Reconciler::new(&parser, &revision).reconcile_key(
        &mut report,
        "TestResults",
        dir.path(),
        &[Utf8PathBuf::from("TestResults.qpa")],
        &mustpass(&["dEQP-VK.a", "dEQP-VK.b"]),
        None,
    );

    assert!(verdict.any_error);
    assert_eq!(
        texts(&report, EntryKind::Failure),
        vec![
            "Wrong number of test results, expected 2, found 3",
            "Verification of vk-default.txt results FAILED",
        ]
    );
}
