// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{FractionSetError, PackageLayoutError};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use itertools::Itertools;
use regex::Regex;
use std::sync::LazyLock;
use walkdir::WalkDir;

/// The extension of result log files.
pub const LOG_EXTENSION: &str = "qpa";

static FRACTION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>.+)-(?P<index>[0-9]+)-of-(?P<total>[0-9]+)$")
        .expect("fraction suffix regex is valid")
});

/// The position of a log within a fractional run, from a `-<index>-of-<total>` suffix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fraction {
    /// The 1-based index of this fraction.
    pub index: usize,
    /// The total number of fractions.
    pub total: usize,
}

/// A result log within a package.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogFile {
    /// The path relative to the package root.
    pub path: Utf8PathBuf,
    /// The fraction suffix, if any.
    pub fraction: Option<Fraction>,
}

/// The result logs sharing one key.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogGroup {
    files: Vec<LogFile>,
}

impl LogGroup {
    /// Returns the logs, unsuffixed logs first and then by fraction index.
    pub fn files(&self) -> &[LogFile] {
        &self.files
    }

    /// Returns the log paths relative to the package root, in order.
    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.files.iter().map(|file| file.path.clone()).collect()
    }

    /// Checks that the fraction suffixes form a complete set `1..=total`.
    pub fn check_fractions(&self) -> Result<(), FractionSetError> {
        let fractions: Vec<_> = self.files.iter().map(|file| file.fraction).collect();
        if fractions.iter().all(Option::is_none) {
            return Ok(());
        }
        let Some(fractions) = fractions.into_iter().collect::<Option<Vec<_>>>() else {
            return Err(FractionSetError::MixedSuffixes);
        };

        let totals: Vec<_> = fractions.iter().map(|f| f.total).unique().collect();
        if totals.len() != 1 {
            return Err(FractionSetError::InconsistentTotal { totals });
        }
        let total = totals[0];

        let indexes: Vec<_> = fractions.iter().map(|f| f.index).collect();
        if !indexes.iter().copied().eq(1..=total) {
            return Err(FractionSetError::IncompleteSet { total, indexes });
        }
        Ok(())
    }

    fn sort(&mut self) {
        self.files
            .sort_by_key(|file| (file.fraction.map(|f| f.index), file.path.clone()));
    }
}

/// The result logs of an extracted package, grouped by key.
#[derive(Clone, Debug)]
pub struct PackageLayout {
    base: Utf8PathBuf,
    test_logs: IndexMap<String, LogGroup>,
}

impl PackageLayout {
    /// Finds every `.qpa` file under `base`.
    ///
    /// A log's key is its path relative to `base`, without the extension and without any
    /// `-<index>-of-<total>` suffix. Keys are sorted.
    pub fn scan(base: &Utf8Path) -> Result<Self, PackageLayoutError> {
        let mut test_logs: IndexMap<String, LogGroup> = IndexMap::new();

        for entry in WalkDir::new(base).follow_links(false) {
            let entry = entry.map_err(|err| PackageLayoutError::Walk {
                dir: base.to_owned(),
                err,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8PathBuf::try_from(entry.into_path())
                .map_err(|err| PackageLayoutError::NonUtf8Path(err.into_path_buf()))?;
            if path.extension() != Some(LOG_EXTENSION) {
                continue;
            }

            let Ok(rel_path) = path.strip_prefix(base) else {
                continue;
            };
            let (key, fraction) = key_for(rel_path);
            tracing::debug!("found test log `{rel_path}` for key `{key}`");
            test_logs.entry(key).or_default().files.push(LogFile {
                path: rel_path.to_owned(),
                fraction,
            });
        }

        for group in test_logs.values_mut() {
            group.sort();
        }
        test_logs.sort_keys();

        Ok(Self {
            base: base.to_owned(),
            test_logs,
        })
    }

    /// Returns the package root.
    pub fn base(&self) -> &Utf8Path {
        &self.base
    }

    /// Returns the log groups by key, in key order.
    pub fn test_logs(&self) -> &IndexMap<String, LogGroup> {
        &self.test_logs
    }

    /// Returns true if no logs were found.
    pub fn is_empty(&self) -> bool {
        self.test_logs.is_empty()
    }
}

fn key_for(rel_path: &Utf8Path) -> (String, Option<Fraction>) {
    let stem = rel_path.with_extension("");
    let stem = stem.components().map(|c| c.as_str()).join("/");

    if let Some(captures) = FRACTION_SUFFIX.captures(&stem) {
        let index = captures["index"].parse();
        let total = captures["total"].parse();
        if let (Ok(index), Ok(total)) = (index, total) {
            return (
                captures["key"].to_owned(),
                Some(Fraction { index, total }),
            );
        }
    }
    (stem, None)
}
