// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of a [`Report`] to JUnit XML.

use super::{EntryKind, Report};
use quick_junit::{NonSuccessKind, TestCase, TestCaseStatus, TestSuite};

const REPORT_NAME: &str = "cts-verify";

/// Builds a JUnit report with one test suite per section.
///
/// Passed checks and failures become test cases. Messages and warnings carry no verdict, so they
/// are attached to the suite's system-out instead.
pub(super) fn to_junit_report(report: &Report) -> quick_junit::Report {
    let name = match report.submission_id() {
        Some(id) => format!("{REPORT_NAME}-{id}"),
        None => REPORT_NAME.to_owned(),
    };
    let mut junit = quick_junit::Report::new(name);

    let suites = report.sections().iter().map(|section| {
        let mut suite = TestSuite::new(section.title());
        let mut system_out = String::new();

        for entry in section.entries() {
            let status = match entry.kind {
                EntryKind::Passed => TestCaseStatus::success(),
                EntryKind::Failure => {
                    let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                    status.set_message(entry.text.as_str());
                    status
                }
                EntryKind::Message | EntryKind::Warning => {
                    system_out.push_str(entry.kind.as_str());
                    system_out.push_str(": ");
                    system_out.push_str(&entry.text);
                    system_out.push('\n');
                    continue;
                }
            };

            let mut testcase = TestCase::new(entry.text.as_str(), status);
            testcase.set_classname(entry.context.as_deref().unwrap_or(section.title()));
            suite.add_test_case(testcase);
        }

        if !system_out.is_empty() {
            suite.set_system_out(system_out);
        }
        suite
    });
    junit.add_test_suites(suites);

    junit
}
