// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// A serializable summary of a verification report.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportSummary {
    /// The submission id, if the package name carried one.
    pub submission_id: Option<String>,

    /// The sections of the report, in the order they were started.
    pub sections: Vec<SectionSummary>,

    /// Per-key verdicts produced while reconciling result logs.
    #[serde(default)]
    pub keys: Vec<KeySummary>,

    /// The total number of failures recorded.
    pub failure_count: usize,

    /// The total number of warnings recorded.
    pub warning_count: usize,
}

impl ReportSummary {
    /// Creates a new, empty summary.
    pub fn new(submission_id: Option<String>) -> Self {
        Self {
            submission_id,
            ..Default::default()
        }
    }

    /// Parses a summary from its JSON form.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Serializes this summary to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns true if any failure was recorded.
    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }
}

/// A titled section of a report.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SectionSummary {
    /// The section heading.
    pub title: String,

    /// Entries recorded while this section was current.
    pub entries: Vec<ReportEntrySummary>,
}

/// A single entry in a report.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportEntrySummary {
    /// The kind of entry.
    pub kind: EntryKindSummary,

    /// The entry text.
    pub text: String,

    /// The file or package the entry refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// The kind of a [`ReportEntrySummary`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKindSummary {
    /// Informational.
    Message,
    /// A check passed.
    Passed,
    /// A check failed.
    Failure,
    /// A non-fatal anomaly.
    Warning,
}

impl fmt::Display for EntryKindSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Passed => write!(f, "passed"),
            Self::Failure => write!(f, "failure"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// The verdict for one log key.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeySummary {
    /// The key, e.g. the relative log path without its extension.
    pub key: String,

    /// The number of log files that made up this key.
    pub file_count: usize,

    /// Whether any error was recorded for this key.
    pub any_error: bool,

    /// Whether the results appeared in mustpass order.
    pub order_ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_summary_json() {
        let json = r#"{
            "submission-id": "1234",
            "sections": [
                {
                    "title": "Preliminary steps",
                    "entries": [
                        { "kind": "message", "text": "Unpacking done.", "context": "VK12_A_B.tgz" },
                        { "kind": "failure", "text": "Missing result for dEQP-VK.a" }
                    ]
                }
            ],
            "failure-count": 1,
            "warning-count": 0
        }"#;

        let summary = ReportSummary::parse_json(json).expect("summary parses");
        assert_eq!(summary.submission_id.as_deref(), Some("1234"));
        assert!(summary.keys.is_empty(), "keys default to empty");
        assert_eq!(
            summary.sections[0].entries[1],
            ReportEntrySummary {
                kind: EntryKindSummary::Failure,
                text: "Missing result for dEQP-VK.a".to_owned(),
                context: None,
            }
        );
        assert!(summary.has_failures());
    }

    #[test]
    fn context_is_omitted_when_absent() {
        let entry = ReportEntrySummary {
            kind: EntryKindSummary::Passed,
            text: "ok".to_owned(),
            context: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"kind":"passed","text":"ok"}"#);
    }
}
