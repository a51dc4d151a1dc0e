// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mustpass lists: the ordered set of test cases a submission must contain.

use crate::errors::MustpassLoadError;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, map::Entry};
use std::fs;

/// An ordered list of unique test case identifiers.
///
/// Uniqueness is checked when the list is constructed, so every `Mustpass` in existence is free of
/// duplicates.
#[derive(Clone, Debug)]
pub struct Mustpass {
    name: String,
    // Maps each case to the 1-based line it was read from.
    cases: IndexMap<String, usize>,
}

impl Mustpass {
    /// Reads a mustpass list from a file.
    ///
    /// Each non-blank line, with surrounding whitespace trimmed, is one case identifier. Bytes
    /// that are not valid UTF-8 are replaced with U+FFFD and a warning is logged.
    pub fn from_path(path: &Utf8Path) -> Result<Self, MustpassLoadError> {
        let bytes = fs::read(path).map_err(|err| MustpassLoadError::Read {
            path: path.to_owned(),
            err,
        })?;
        let contents = match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!("mustpass `{path}` is not valid UTF-8, invalid bytes were replaced");
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        let name = path.file_name().unwrap_or(path.as_str()).to_owned();
        let mustpass = Self::parse(name, &contents).map_err(|dup| dup.into_error(path))?;
        tracing::debug!("read {} cases from mustpass `{path}`", mustpass.len());
        Ok(mustpass)
    }

    /// Builds a mustpass list from case identifiers, failing on the first duplicate.
    pub fn from_cases<I, S>(name: impl Into<String>, cases: I) -> Result<Self, MustpassLoadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut map = IndexMap::new();
        for (ndx, case) in cases.into_iter().enumerate() {
            insert_unique(&mut map, case.into(), ndx + 1)
                .map_err(|dup| dup.into_error(Utf8Path::new(&name)))?;
        }
        Ok(Self { name, cases: map })
    }

    fn parse(name: String, contents: &str) -> Result<Self, Duplicate> {
        let mut cases = IndexMap::new();
        for (ndx, line) in contents.lines().enumerate() {
            let case = line.trim();
            if !case.is_empty() {
                insert_unique(&mut cases, case.to_owned(), ndx + 1)?;
            }
        }
        Ok(Self { name, cases })
    }

    /// Returns the display name of this list, typically its file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of cases.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true if the list has no cases.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Returns true if the list contains the given case.
    pub fn contains(&self, case: &str) -> bool {
        self.cases.contains_key(case)
    }

    /// Iterates over the cases in list order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.cases.keys().map(String::as_str)
    }
}

#[derive(Debug)]
struct Duplicate {
    case: String,
    first_line: usize,
    line: usize,
}

impl Duplicate {
    fn into_error(self, path: &Utf8Path) -> MustpassLoadError {
        MustpassLoadError::DuplicateCase {
            path: Utf8PathBuf::from(path),
            case: self.case,
            first_line: self.first_line,
            line: self.line,
        }
    }
}

fn insert_unique(
    cases: &mut IndexMap<String, usize>,
    case: String,
    line: usize,
) -> Result<(), Duplicate> {
    match cases.entry(case) {
        Entry::Vacant(entry) => {
            entry.insert(line);
            Ok(())
        }
        Entry::Occupied(entry) => Err(Duplicate {
            case: entry.key().clone(),
            first_line: *entry.get(),
            line,
        }),
    }
}
