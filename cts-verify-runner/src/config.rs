// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for cts-verify.
//!
//! The embedded [default config](VerifyConfig::DEFAULT_CONFIG) is always read first. A
//! user-provided file, or `.config/cts-verify.toml` if present, is layered on top of it.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use regex::Regex;
use serde::Deserialize;
use std::{collections::BTreeSet, fmt};
use tracing::warn;

/// Overall configuration for cts-verify.
#[derive(Clone, Debug)]
pub struct VerifyConfig {
    source: SourceConfig,
    releases: ReleasePatterns,
    mustpass: MustpassConfig,
}

impl VerifyConfig {
    /// The default location of the config, relative to the current directory.
    pub const CONFIG_PATH: &'static str = ".config/cts-verify.toml";

    /// The default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The name used in errors about the default config.
    const DEFAULT_CONFIG_NAME: &'static str = "<default config>";

    /// Reads the config from `config_file`, or if not specified from `.config/cts-verify.toml` in
    /// `cwd` when it exists.
    pub fn from_sources(
        cwd: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let builder = Self::make_default_config();
        let (builder, config_path) = match config_file {
            Some(path) => (
                builder.add_source(File::new(path.as_str(), FileFormat::Toml).required(true)),
                path.to_owned(),
            ),
            None => {
                let path = cwd.join(Self::CONFIG_PATH);
                if path.is_file() {
                    (
                        builder.add_source(File::new(path.as_str(), FileFormat::Toml)),
                        path,
                    )
                } else {
                    (builder, Utf8PathBuf::from(Self::DEFAULT_CONFIG_NAME))
                }
            }
        };

        Self::build(&builder).map_err(|kind| ConfigParseError::new(config_path, kind))
    }

    /// Returns the default config.
    pub fn default_config() -> Result<Self, ConfigParseError> {
        Self::build(&Self::make_default_config())
            .map_err(|kind| ConfigParseError::new(Self::DEFAULT_CONFIG_NAME, kind))
    }

    /// Returns the source repository configuration.
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Returns the release patterns.
    pub fn releases(&self) -> &ReleasePatterns {
        &self.releases
    }

    /// Returns the mustpass locations.
    pub fn mustpass(&self) -> &MustpassConfig {
        &self.mustpass
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build(builder: &ConfigBuilder<DefaultState>) -> Result<Self, ConfigParseErrorKind> {
        let (deserialized, ignored) = Self::build_and_deserialize_config(builder)?;
        if !ignored.is_empty() {
            let keys: Vec<_> = ignored.into_iter().collect();
            warn!("ignoring unknown configuration keys: {}", keys.join(", "));
        }

        let VerifyConfigDeserialize {
            source,
            releases,
            mustpass,
        } = deserialized;
        mustpass.validate()?;

        Ok(Self {
            source,
            releases: releases.compile()?,
            mustpass,
        })
    }

    /// Returns the deserialized config and the paths of any unknown keys.
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(VerifyConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: VerifyConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The key is reported by serde_path_to_error, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct VerifyConfigDeserialize {
    source: SourceConfig,
    releases: ReleasePatternsDeserialize,
    mustpass: MustpassConfig,
}

/// Where the reference source comes from.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    mirrors: Vec<String>,
    #[serde(default)]
    clone_dir: Option<Utf8PathBuf>,
}

impl SourceConfig {
    /// The directory name used for clones when `clone-dir` isn't set.
    pub const DEFAULT_CLONE_DIR_NAME: &'static str = "VK-GL-CTS";

    /// Returns the repositories to clone from, in order of preference.
    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    /// Returns the directory to clone into.
    pub fn clone_dir(&self) -> Utf8PathBuf {
        match &self.clone_dir {
            Some(dir) => dir.clone(),
            None => {
                let temp_dir = Utf8PathBuf::try_from(std::env::temp_dir())
                    .unwrap_or_else(|_| Utf8PathBuf::from("."));
                temp_dir.join(Self::DEFAULT_CLONE_DIR_NAME)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReleasePatternsDeserialize {
    supported: Vec<String>,
    withdrawn: Vec<String>,
    legacy_mustpass_dir: Vec<String>,
}

impl ReleasePatternsDeserialize {
    fn compile(self) -> Result<ReleasePatterns, ConfigParseErrorKind> {
        Ok(ReleasePatterns {
            supported: compile_patterns("supported", self.supported)?,
            withdrawn: compile_patterns("withdrawn", self.withdrawn)?,
            legacy_mustpass_dir: compile_patterns("legacy-mustpass-dir", self.legacy_mustpass_dir)?,
        })
    }
}

fn compile_patterns(
    list: &'static str,
    patterns: Vec<String>,
) -> Result<Vec<Regex>, ConfigParseErrorKind> {
    patterns
        .into_iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                ConfigParseErrorKind::InvalidReleasePattern {
                    list,
                    pattern,
                    err,
                }
            })
        })
        .collect()
}

/// Regular expressions classifying release tags. Each pattern matches a whole tag.
#[derive(Clone, Debug)]
pub struct ReleasePatterns {
    supported: Vec<Regex>,
    withdrawn: Vec<Regex>,
    legacy_mustpass_dir: Vec<Regex>,
}

impl ReleasePatterns {
    /// Returns true if `tag` is a release submissions can be made against.
    pub fn is_supported(&self, tag: &str) -> bool {
        self.supported.iter().any(|re| re.is_match(tag))
    }

    /// Returns true if `tag` is a withdrawn release.
    pub fn is_withdrawn(&self, tag: &str) -> bool {
        self.withdrawn.iter().any(|re| re.is_match(tag))
    }

    /// Returns true if `tag` keeps its mustpass lists in a versioned directory.
    pub fn uses_legacy_mustpass_dir(&self, tag: &str) -> bool {
        self.legacy_mustpass_dir.iter().any(|re| re.is_match(tag))
    }
}

/// A path template. `{dir}` and `{version}` are replaced on expansion.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct MustpassTemplate(String);

impl MustpassTemplate {
    /// Expands the template.
    pub fn expand(&self, dir: &str, version: impl fmt::Display) -> Utf8PathBuf {
        Utf8PathBuf::from(
            self.0
                .replace("{dir}", dir)
                .replace("{version}", &version.to_string()),
        )
    }

    fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Mustpass locations for each API.
#[derive(Clone, Debug, Deserialize)]
pub struct MustpassConfig {
    /// Vulkan mustpass files.
    pub vk: VkMustpassConfig,
    /// OpenGL mustpass directory.
    pub gl: DirMustpassConfig,
    /// OpenGL ES mustpass directory.
    pub es: DirMustpassConfig,
}

impl MustpassConfig {
    fn validate(&self) -> Result<(), ConfigParseErrorKind> {
        let templates = [
            ("vk.full", &self.vk.full),
            ("vk.fraction", &self.vk.fraction),
            ("gl.dir", &self.gl.dir),
            ("es.dir", &self.es.dir),
        ];
        match templates.into_iter().find(|(_, template)| template.is_empty()) {
            Some((name, _)) => Err(ConfigParseErrorKind::EmptyMustpassTemplate { name }),
            None => Ok(()),
        }
    }
}

/// Vulkan mustpass files.
#[derive(Clone, Debug, Deserialize)]
pub struct VkMustpassConfig {
    /// The full mustpass list.
    pub full: MustpassTemplate,
    /// The fraction mustpass list, repeated by every fractional log.
    pub fraction: MustpassTemplate,
}

/// A directory holding one mustpass file per log key.
#[derive(Clone, Debug, Deserialize)]
pub struct DirMustpassConfig {
    /// The directory template.
    pub dir: MustpassTemplate,
}
