// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use cts_verify_runner::{
    config::VerifyConfig,
    package::GIT_LOG_FILE_NAME,
    reporter::{EntryKind, Report},
    source::SourceTree,
    verify::Verifier,
};
use duct::cmd;
use pretty_assertions::assert_eq;

const TAG: &str = "vulkan-cts-1.3.7.2";
const MUSTPASS: &[&str] = &["dEQP-VK.info.build", "dEQP-VK.api.copy", "dEQP-VK.api.fill"];

const GL_TAG: &str = "opengl-cts-4.6.3.1";
const GL_MUSTPASS_DIR: &str = "external/openglcts/data/mustpass/gl/khronos_mustpass/main";
const GL_MAIN: &[&str] = &["KHR-GL46.info.vendor", "KHR-GL46.info.renderer"];
const GL_SINGLE: &[&str] = &[
    "KHR-Single-GL46.arrays_of_arrays_gl.SizedDeclarationsPrimitive",
    "KHR-Single-GL46.enhanced_layouts.xfb_capture_struct",
    "KHR-Single-GL46.subgroups.builtin.subgroupsize",
];

/// A git repository with tagged mustpass lists.
struct SourceFixture {
    dir: Utf8TempDir,
    head: String,
    tag: &'static str,
}

impl SourceFixture {
    /// A Vulkan source with a single `vk-default.txt`.
    fn new() -> Self {
        Self::with_mustpass(
            TAG,
            &[("external/vulkancts/mustpass/main/vk-default.txt", MUSTPASS)],
        )
    }

    /// An OpenGL source with `gl46-main.txt` and `gl46-khr-single.txt`.
    fn opengl() -> Self {
        Self::with_mustpass(
            GL_TAG,
            &[
                (format!("{GL_MUSTPASS_DIR}/gl46-main.txt").as_str(), GL_MAIN),
                (format!("{GL_MUSTPASS_DIR}/gl46-khr-single.txt").as_str(), GL_SINGLE),
            ],
        )
    }

    fn with_mustpass(tag: &'static str, lists: &[(&str, &[&str])]) -> Self {
        let dir = temp_dir("cts-verify-source-");
        let root = dir.path();
        for (rel_path, cases) in lists {
            write_file(&root.join(rel_path), &cases.join("\n"));
        }

        git(root, &["init", "-q"]);
        git(root, &["add", "-A"]);
        git(
            root,
            &[
                "-c",
                "user.name=cts-verify",
                "-c",
                "user.email=cts-verify@example.com",
                "-c",
                "commit.gpgsign=false",
                "commit",
                "-q",
                "-m",
                "Add mustpass",
            ],
        );
        git(root, &["tag", tag]);
        let head = git(root, &["rev-parse", "HEAD"]);
        Self { dir, head, tag }
    }

    fn root(&self) -> &Utf8Path {
        self.dir.path()
    }

    /// Writes a package built from this source, with one log holding `cases`.
    fn write_package(&self, dir: &Utf8Path, cases: &[&str]) {
        self.write_git_log(dir);
        self.write_log(&dir.join("TestResults.qpa"), cases);
    }

    fn write_git_log(&self, dir: &Utf8Path) {
        write_file(
            &dir.join(GIT_LOG_FILE_NAME),
            &format!(
                "commit {} (HEAD, tag: {})\n\n    Add mustpass\n",
                self.head, self.tag
            ),
        );
    }

    /// Writes a log built from this source in which every case in `cases` passed.
    fn write_log(&self, path: &Utf8Path, cases: &[&str]) {
        let cases: Vec<_> = cases.iter().map(|case| (*case, "Pass")).collect();
        write_file(
            path,
            &qpa(
                &format!("git-{}", self.head),
                &format!("0x{}", &self.head[..8]),
                &cases,
            ),
        );
    }
}

fn git(dir: &Utf8Path, args: &[&str]) -> String {
    cmd("git", args).dir(dir).stderr_null().read().unwrap()
}

#[test]
fn verifies_complete_package() {
    let source_fixture = SourceFixture::new();
    let package = temp_dir("cts-verify-package-");
    source_fixture.write_package(package.path(), MUSTPASS);

    let config = VerifyConfig::default_config().unwrap();
    let source = SourceTree::open(source_fixture.root()).unwrap();
    let mut report = Report::new(None, false);
    let verdict =
        Verifier::new(&config, &source, "VK13_Acme_GPU.tgz", package.path()).verify(&mut report);

    assert!(
        !report.has_failures(),
        "failures: {:?}",
        texts(&report, EntryKind::Failure)
    );
    assert_eq!(verdict.keys().len(), 1);
    assert_eq!(verdict.keys()[0].key, "TestResults");
    assert!(verdict.keys()[0].order_ok);

    let titles: Vec<_> = report.sections().iter().map(|s| s.title()).collect();
    assert_eq!(titles, vec!["Preliminary steps", "Verify TestResults"]);
    assert!(
        texts(&report, EntryKind::Passed)
            .contains(&format!("Checked out {TAG} at {}", source_fixture.head).as_str())
    );
}

#[test]
fn incomplete_package_fails() {
    let source_fixture = SourceFixture::new();
    let package = temp_dir("cts-verify-package-");
    source_fixture.write_package(package.path(), &MUSTPASS[..2]);

    let config = VerifyConfig::default_config().unwrap();
    let source = SourceTree::open(source_fixture.root()).unwrap();
    let mut report = Report::new(None, false);
    let verdict =
        Verifier::new(&config, &source, "VK13_Acme_GPU.tgz", package.path()).verify(&mut report);

    assert!(verdict.any_error());
    assert!(
        texts(&report, EntryKind::Failure).contains(&"Missing result for dEQP-VK.api.fill")
    );
}

#[test]
fn unknown_release_stops_verification() {
    let source_fixture = SourceFixture::new();
    let package = temp_dir("cts-verify-package-");
    write_file(
        &package.path().join(GIT_LOG_FILE_NAME),
        "commit 0123456789abcdef (HEAD, tag: some-fork-1.0)\n",
    );

    let config = VerifyConfig::default_config().unwrap();
    let source = SourceTree::open(source_fixture.root()).unwrap();
    let mut report = Report::new(None, false);
    let verdict =
        Verifier::new(&config, &source, "VK13_Acme_GPU.tgz", package.path()).verify(&mut report);

    assert!(verdict.keys().is_empty());
    let failures = texts(&report, EntryKind::Failure);
    assert_eq!(failures.len(), 1);
    assert!(
        failures[0].starts_with("No supported release tag found in"),
        "failure: {}",
        failures[0]
    );
}

#[test]
fn opengl_keys_are_checked_against_their_own_mustpass() {
    let source_fixture = SourceFixture::opengl();
    let package = temp_dir("cts-verify-package-");
    let base = package.path();
    source_fixture.write_git_log(base);
    source_fixture.write_log(&base.join("gl46-main-1-of-2.qpa"), GL_MAIN);
    source_fixture.write_log(&base.join("gl46-main-2-of-2.qpa"), GL_MAIN);
    source_fixture.write_log(&base.join("gl46-khr-single.qpa"), &GL_SINGLE[..2]);
    source_fixture.write_log(&base.join("gl46-waivers.qpa"), GL_MAIN);

    let config = VerifyConfig::default_config().unwrap();
    let source = SourceTree::open(source_fixture.root()).unwrap();
    let mut report = Report::new(None, false);
    let verdict = Verifier::new(&config, &source, "GL46_Acme_GPU.tgz", base).verify(&mut report);

    let keys: Vec<_> = verdict
        .keys()
        .iter()
        .map(|key| (key.key.as_str(), key.file_count, key.any_error))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("gl46-khr-single", 1, true),
            ("gl46-main", 2, false),
            ("gl46-waivers", 1, true),
        ]
    );
    assert!(verdict.any_error());

    let titles: Vec<_> = report.sections().iter().map(|s| s.title()).collect();
    assert_eq!(
        titles,
        vec![
            "Preliminary steps",
            "Verify gl46-khr-single",
            "Verify gl46-main",
            "Verify gl46-waivers",
        ]
    );

    let failures = texts(&report, EntryKind::Failure);
    assert_eq!(failures.len(), 4, "failures: {failures:?}");
    assert_eq!(
        failures[..3],
        [
            "Wrong number of test results, expected 3, found 2",
            "Missing result for KHR-Single-GL46.subgroups.builtin.subgroupsize",
            "Verification of gl46-khr-single.txt results FAILED",
        ]
    );
    let waivers_path = source_fixture
        .root()
        .join(GL_MUSTPASS_DIR)
        .join("gl46-waivers.txt");
    assert!(
        failures[3].starts_with(&format!("failed to open mustpass file `{waivers_path}`")),
        "failure: {}",
        failures[3]
    );

    let passed = texts(&report, EntryKind::Passed);
    assert_eq!(
        passed
            .iter()
            .filter(|text| **text == "Verification of gl46-main.txt results PASSED")
            .count(),
        2
    );
}
