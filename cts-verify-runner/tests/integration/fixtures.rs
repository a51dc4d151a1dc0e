// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use cts_verify_runner::{
    integrity::SourceRevision,
    reporter::{EntryKind, Report},
};
use std::{fmt::Write, fs};

pub(crate) const REVISION: &str = "0123456789abcdef0123456789abcdef01234567";

pub(crate) fn revision() -> SourceRevision {
    REVISION.parse().unwrap()
}

pub(crate) fn temp_dir(prefix: &str) -> Utf8TempDir {
    camino_tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .unwrap()
}

/// Renders a batch result log. Each case is `(name, status code)`.
pub(crate) fn qpa(release_name: &str, release_id: &str, cases: &[(&str, &str)]) -> String {
    let mut out = format!(
        "#sessionInfo releaseName {release_name}\n\
         #sessionInfo releaseId {release_id}\n\
         #sessionInfo targetName \"Surfaceless\"\n\
         #beginSession\n"
    );
    for (name, status) in cases {
        write!(
            out,
            "#beginTestCaseResult {name}\n\
             <?xml version=\"1.0\"?>\n\
             <TestCaseResult Version=\"0.3.4\" CasePath=\"{name}\" CaseType=\"SelfValidate\">\n \
             <Result StatusCode=\"{status}\">{status}</Result>\n\
             </TestCaseResult>\n\
             #endTestCaseResult\n"
        )
        .unwrap();
    }
    out.push_str("#endSession\n");
    out
}

/// A log carrying the metadata of [`REVISION`], with every case passing.
pub(crate) fn passing_qpa(cases: &[&str]) -> String {
    let cases: Vec<_> = cases.iter().map(|case| (*case, "Pass")).collect();
    qpa(&format!("git-{REVISION}"), "0x01234567", &cases)
}

pub(crate) fn write_file(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub(crate) fn texts(report: &Report, kind: EntryKind) -> Vec<&str> {
    report
        .entries()
        .filter(|entry| entry.kind == kind)
        .map(|entry| entry.text.as_str())
        .collect()
}
