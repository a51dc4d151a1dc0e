// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verification of a whole extracted package.

use crate::{
    config::VerifyConfig,
    errors::DisplayErrorChain,
    integrity::SourceRevision,
    log_parser::{BatchLogParser, LogReader},
    mustpass::Mustpass,
    package::{
        ApiType, PackageLayout, ReleaseTag, SubmissionName, find_release_tag, parse_submission_id,
    },
    reconcile::{KeyVerdict, PackageVerdict, Reconciler},
    reporter::ReportSink,
    source::SourceTree,
};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

static DEFAULT_LOG_READER: BatchLogParser = BatchLogParser;

/// Verifies an extracted submission package against the reference source.
pub struct Verifier<'a> {
    config: &'a VerifyConfig,
    source: &'a SourceTree,
    package_file_name: String,
    package_dir: Utf8PathBuf,
    khronos: bool,
    reader: &'a dyn LogReader,
}

impl<'a> Verifier<'a> {
    /// Creates a new verifier for the package file `package_file_name`, extracted to
    /// `package_dir`.
    pub fn new(
        config: &'a VerifyConfig,
        source: &'a SourceTree,
        package_file_name: impl Into<String>,
        package_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            config,
            source,
            package_file_name: package_file_name.into(),
            package_dir: package_dir.into(),
            khronos: false,
            reader: &DEFAULT_LOG_READER,
        }
    }

    /// Sets whether the package name starts with a submission id.
    pub fn set_khronos(&mut self, khronos: bool) -> &mut Self {
        self.khronos = khronos;
        self
    }

    /// Sets the reader used for result logs.
    pub fn set_log_reader(&mut self, reader: &'a dyn LogReader) -> &mut Self {
        self.reader = reader;
        self
    }

    /// Runs verification, writing results to `sink`.
    ///
    /// Problems with the package are recorded in `sink` and never returned as errors. Checks that
    /// depend on a failed step are skipped.
    pub fn verify(&self, sink: &mut dyn ReportSink) -> PackageVerdict {
        let mut verdict = PackageVerdict::new();
        let context = Some(self.package_file_name.as_str());

        sink.section("Preliminary steps");
        let Some(name) = self.check_name(sink) else {
            return verdict;
        };
        if !name.is_supported() {
            sink.warning(
                &format!("Not supported type of submission: {}", name.api_name()),
                context,
            );
            return verdict;
        }
        sink.message(
            &format!("Started verification for {}", name.api_name()),
            context,
        );

        let Some((tag, revision)) = self.prepare_source(sink) else {
            return verdict;
        };

        let layout = match PackageLayout::scan(&self.package_dir) {
            Ok(layout) => layout,
            Err(err) => {
                sink.failure(&DisplayErrorChain::new(&err).to_string(), context);
                return verdict;
            }
        };
        if layout.is_empty() {
            sink.failure("No test logs found in the package", context);
            return verdict;
        }
        for (key, group) in layout.test_logs() {
            match group.check_fractions() {
                Ok(()) => sink.passed(
                    &format!("Found {} test log(s)", group.files().len()),
                    Some(key),
                ),
                Err(err) => sink.failure(&format!("Inconsistent test logs: {err}"), Some(key)),
            }
        }

        let reconciler = Reconciler::new(self.reader, &revision);
        let mustpass_dir = tag.mustpass_dir(self.config.releases());
        match name.api() {
            ApiType::Vulkan => {
                self.verify_vulkan(sink, &reconciler, &layout, &name, &mustpass_dir, &mut verdict)
            }
            ApiType::OpenGl | ApiType::OpenGlEs => {
                self.verify_gl(sink, &reconciler, &layout, &name, &mustpass_dir, &mut verdict)
            }
        }

        info!(
            "verified {} keys, {}",
            verdict.keys().len(),
            if verdict.any_error() { "with errors" } else { "no errors" }
        );
        verdict
    }

    fn check_name(&self, sink: &mut dyn ReportSink) -> Option<SubmissionName> {
        let context = Some(self.package_file_name.as_str());
        if self.khronos
            && let Err(err) = parse_submission_id(&self.package_file_name)
        {
            sink.failure(&err.to_string(), context);
        }
        match SubmissionName::parse(&self.package_file_name, self.khronos) {
            Ok(name) => Some(name),
            Err(err) => {
                sink.failure(&err.to_string(), context);
                None
            }
        }
    }

    fn prepare_source(&self, sink: &mut dyn ReportSink) -> Option<(ReleaseTag, SourceRevision)> {
        let tag = match find_release_tag(&self.package_dir, self.config.releases()) {
            Ok(tag) => tag,
            Err(err) => {
                sink.failure(&DisplayErrorChain::new(&err).to_string(), None);
                return None;
            }
        };
        sink.message(&format!("Found release tag {tag}"), None);

        if let Err(err) = self.source.checkout(tag.as_str()) {
            sink.failure(
                &format!(
                    "Failed to checkout release tag {tag}: {}",
                    DisplayErrorChain::new(&err)
                ),
                None,
            );
            return None;
        }

        match self.source.head_revision() {
            Ok(revision) => {
                sink.passed(&format!("Checked out {tag} at {revision}"), None);
                Some((tag, revision))
            }
            Err(err) => {
                sink.failure(&DisplayErrorChain::new(&err).to_string(), None);
                None
            }
        }
    }

    fn verify_vulkan(
        &self,
        sink: &mut dyn ReportSink,
        reconciler: &Reconciler<'_>,
        layout: &PackageLayout,
        name: &SubmissionName,
        mustpass_dir: &str,
        verdict: &mut PackageVerdict,
    ) {
        let templates = &self.config.mustpass().vk;
        let full = self.load_mustpass(sink, &templates.full.expand(mustpass_dir, name.version()));
        let needs_fraction = layout
            .test_logs()
            .values()
            .any(|group| group.files().len() > 1);
        let fraction = if needs_fraction {
            self.load_mustpass(sink, &templates.fraction.expand(mustpass_dir, name.version()))
        } else {
            None
        };

        for (key, group) in layout.test_logs() {
            let files = group.paths();
            sink.section(&format!("Verify {key}"));
            let key_verdict = match (&full, &fraction) {
                (Some(full), _) if files.len() <= 1 => {
                    reconciler.reconcile_key(sink, key, layout.base(), &files, full, None)
                }
                (Some(full), Some(fraction)) => reconciler.reconcile_key(
                    sink,
                    key,
                    layout.base(),
                    &files,
                    full,
                    Some(fraction),
                ),
                _ => {
                    sink.failure("Skipped: mustpass not available", Some(key));
                    KeyVerdict::skipped(key, files.len())
                }
            };
            verdict.push(key_verdict);
        }
    }

    fn verify_gl(
        &self,
        sink: &mut dyn ReportSink,
        reconciler: &Reconciler<'_>,
        layout: &PackageLayout,
        name: &SubmissionName,
        mustpass_dir: &str,
        verdict: &mut PackageVerdict,
    ) {
        let template = match name.api() {
            ApiType::OpenGlEs => &self.config.mustpass().es.dir,
            _ => &self.config.mustpass().gl.dir,
        };
        let dir = template.expand(mustpass_dir, name.version());

        for (key, group) in layout.test_logs() {
            let files = group.paths();
            sink.section(&format!("Verify {key}"));
            let mustpass_name = key.rsplit('/').next().unwrap_or(key);
            let key_verdict =
                match self.load_mustpass(sink, &dir.join(format!("{mustpass_name}.txt"))) {
                    Some(mustpass) => {
                        reconciler.reconcile_each(sink, key, layout.base(), &files, &mustpass)
                    }
                    None => KeyVerdict::skipped(key, files.len()),
                };
            verdict.push(key_verdict);
        }
    }

    /// Loads a mustpass list at `rel_path` within the source tree, reporting any failure.
    fn load_mustpass(&self, sink: &mut dyn ReportSink, rel_path: &Utf8Path) -> Option<Mustpass> {
        match Mustpass::from_path(&self.source.root().join(rel_path)) {
            Ok(mustpass) => {
                sink.message(
                    &format!("Loaded {} cases from {rel_path}", mustpass.len()),
                    None,
                );
                Some(mustpass)
            }
            Err(err) => {
                sink.failure(&DisplayErrorChain::new(&err).to_string(), None);
                None
            }
        }
    }
}
