// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{config::ReleasePatterns, errors::ReleaseTagError};
use camino::Utf8Path;
use std::{fmt, fs};

/// The file in the package root holding the `git log` output of the source the package was built
/// from.
pub const GIT_LOG_FILE_NAME: &str = "git-log.txt";

/// The mustpass directory used by releases that don't have a versioned one.
pub const MAIN_MUSTPASS_DIR: &str = "main";

/// A release tag of the reference source.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    /// Creates a release tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the mustpass directory for this release.
    ///
    /// Releases matching `releases.legacy-mustpass-dir` keep their mustpass files in a directory
    /// named after the first three components of their version (`vulkan-cts-1.1.2.3` uses
    /// `1.1.2`). Every other release uses [`MAIN_MUSTPASS_DIR`].
    pub fn mustpass_dir(&self, releases: &ReleasePatterns) -> String {
        if !releases.uses_legacy_mustpass_dir(&self.0) {
            return MAIN_MUSTPASS_DIR.to_owned();
        }
        let version = self.0.rsplit('-').next().unwrap_or(&self.0);
        version.splitn(4, '.').take(3).collect::<Vec<_>>().join(".")
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds the release the package was built from.
///
/// Reads [`GIT_LOG_FILE_NAME`] in `base` and returns the first `tag: <name>` decoration that
/// matches a supported release.
pub fn find_release_tag(
    base: &Utf8Path,
    releases: &ReleasePatterns,
) -> Result<ReleaseTag, ReleaseTagError> {
    let path = base.join(GIT_LOG_FILE_NAME);
    let contents = fs::read_to_string(&path).map_err(|err| ReleaseTagError::Read {
        path: path.clone(),
        err,
    })?;

    let tag = tag_decorations(&contents)
        .find(|tag| releases.is_supported(tag))
        .ok_or_else(|| ReleaseTagError::NotFound { path: path.clone() })?;

    if releases.is_withdrawn(tag) {
        return Err(ReleaseTagError::Withdrawn {
            tag: tag.to_owned(),
        });
    }
    tracing::debug!("found release tag `{tag}` in `{path}`");
    Ok(ReleaseTag::new(tag))
}

/// Iterates over the names in `tag: <name>` decorations, in order.
fn tag_decorations(git_log: &str) -> impl Iterator<Item = &str> {
    git_log.match_indices("tag: ").filter_map(move |(start, prefix)| {
        let rest = &git_log[start + prefix.len()..];
        let end = rest
            .find(|c: char| c == ',' || c == ')' || c.is_whitespace())
            .unwrap_or(rest.len());
        let tag = &rest[..end];
        (!tag.is_empty()).then_some(tag)
    })
}
