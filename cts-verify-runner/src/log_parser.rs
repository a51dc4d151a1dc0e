// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading result logs.
//!
//! The reconciler only needs the per-case outcomes and the session metadata from a log, so it
//! reads logs through the [`LogReader`] trait. [`BatchLogParser`] implements it for the
//! line-oriented batch result format written by the conformance test runner.

use crate::{
    errors::{DisplayErrorChain, LogReadError, XmlStatusError},
    status::StatusCode,
};
use camino::Utf8Path;
use quick_xml::{Reader, events::Event};
use std::{collections::BTreeMap, fs};

/// The outcome of one test case in a result log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCaseResult {
    /// The case identifier.
    pub name: String,

    /// The recorded status.
    pub status: StatusCode,
}

impl TestCaseResult {
    /// Creates a new result.
    pub fn new(name: impl Into<String>, status: StatusCode) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// A parsed result log.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestLog {
    results: Vec<TestCaseResult>,
    session_info: BTreeMap<String, String>,
}

impl TestLog {
    /// Creates a log from its parts.
    pub fn new(results: Vec<TestCaseResult>, session_info: BTreeMap<String, String>) -> Self {
        Self {
            results,
            session_info,
        }
    }

    /// Returns the results in log order.
    pub fn results(&self) -> &[TestCaseResult] {
        &self.results
    }

    /// Consumes the log, returning the results in log order.
    pub fn into_results(self) -> Vec<TestCaseResult> {
        self.results
    }

    /// Returns the session metadata recorded in the log header.
    pub fn session_info(&self) -> &BTreeMap<String, String> {
        &self.session_info
    }
}

/// Reads result logs from disk.
pub trait LogReader {
    /// Reads and parses the log at `path`.
    fn read_log(&self, path: &Utf8Path) -> Result<TestLog, LogReadError>;
}

/// Parser for batch result logs.
///
/// The format is line oriented. Lines starting with `#` are tags:
///
/// ```text
/// #sessionInfo releaseName git-0123456789abcdef0123456789abcdef01234567
/// #beginSession
/// #beginTestCaseResult dEQP-VK.info.build
/// <?xml version="1.0"?>
/// <TestCaseResult CasePath="dEQP-VK.info.build">
///  <Result StatusCode="Pass">Pass</Result>
/// </TestCaseResult>
/// #endTestCaseResult
/// #beginTestCaseResult dEQP-VK.api.smoke.triangle
/// #terminateTestCaseResult Crash
/// #endSession
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchLogParser;

impl BatchLogParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses a log from a string.
    pub fn parse_str(&self, input: &str) -> TestLog {
        let mut state = ParseState::default();
        for line in input.lines() {
            state.parse_line(line);
        }
        state.finish()
    }
}

impl LogReader for BatchLogParser {
    fn read_log(&self, path: &Utf8Path) -> Result<TestLog, LogReadError> {
        let bytes = fs::read(path).map_err(|err| LogReadError::new(path, err))?;
        let input = match String::from_utf8(bytes) {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!("test log `{path}` is not valid UTF-8, invalid bytes were replaced");
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        let log = self.parse_str(&input);
        tracing::debug!("read {} results from `{path}`", log.results.len());
        Ok(log)
    }
}

#[derive(Debug, Default)]
struct ParseState {
    current: Option<OpenCase>,
    results: Vec<TestCaseResult>,
    session_info: BTreeMap<String, String>,
}

#[derive(Debug)]
struct OpenCase {
    name: String,
    xml: String,
}

impl ParseState {
    fn parse_line(&mut self, line: &str) {
        if line.starts_with('#') {
            self.parse_tag_line(line);
        } else if let Some(current) = &mut self.current {
            current.xml.push_str(line);
            current.xml.push('\n');
        }
    }

    fn parse_tag_line(&mut self, line: &str) {
        let line = line.trim_end();
        let (tag, rest) = match line.split_once(char::is_whitespace) {
            Some((tag, rest)) => (tag, rest.trim()),
            None => (line, ""),
        };

        match tag {
            "#sessionInfo" => {
                let (key, value) = match rest.split_once(char::is_whitespace) {
                    Some((key, value)) => (key, value.trim()),
                    None => (rest, ""),
                };
                if key.is_empty() {
                    tracing::warn!("ignoring #sessionInfo line without a key");
                } else {
                    self.session_info.insert(key.to_owned(), value.to_owned());
                }
            }
            "#beginSession" | "#endSession" => {}
            "#beginTestCaseResult" => {
                if rest.is_empty() {
                    tracing::warn!("ignoring #beginTestCaseResult without a case name");
                    return;
                }
                if let Some(open) = self.current.take() {
                    tracing::warn!(
                        "#beginTestCaseResult for `{rest}` while `{}` is still open",
                        open.name
                    );
                    self.results
                        .push(TestCaseResult::new(open.name, StatusCode::InternalError));
                }
                self.current = Some(OpenCase {
                    name: rest.to_owned(),
                    xml: String::new(),
                });
            }
            "#endTestCaseResult" => match self.current.take() {
                Some(open) => {
                    let status = match status_from_xml(&open.xml) {
                        Ok(status) => status,
                        Err(error) => {
                            tracing::warn!(
                                "invalid result for `{}`: {}",
                                open.name,
                                DisplayErrorChain::new(&error),
                            );
                            StatusCode::InternalError
                        }
                    };
                    self.results.push(TestCaseResult::new(open.name, status));
                }
                None => tracing::warn!("#endTestCaseResult without #beginTestCaseResult"),
            },
            "#terminateTestCaseResult" => match self.current.take() {
                Some(open) => {
                    let status = rest.parse().unwrap_or_else(|error| {
                        tracing::warn!("invalid termination for `{}`: {error}", open.name);
                        StatusCode::InternalError
                    });
                    self.results.push(TestCaseResult::new(open.name, status));
                }
                None => tracing::warn!("#terminateTestCaseResult without #beginTestCaseResult"),
            },
            other => tracing::debug!("ignoring unknown tag `{other}`"),
        }
    }

    fn finish(mut self) -> TestLog {
        if let Some(open) = self.current.take() {
            // The runner died while executing this case.
            tracing::warn!("log ended while `{}` was still open", open.name);
            self.results.push(TestCaseResult::new(open.name, StatusCode::Crash));
        }
        TestLog {
            results: self.results,
            session_info: self.session_info,
        }
    }
}

fn status_from_xml(xml: &str) -> Result<StatusCode, XmlStatusError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element))
                if element.local_name().as_ref() == b"Result" =>
            {
                let attr = element
                    .try_get_attribute("StatusCode")
                    .map_err(XmlStatusError::Xml)?
                    .ok_or(XmlStatusError::NoStatusCode)?;
                let value = attr
                    .unescape_value()
                    .map_err(XmlStatusError::Xml)?;
                return Ok(value.trim().parse::<StatusCode>()?);
            }
            Ok(Event::Eof) => return Err(XmlStatusError::NoResult),
            Ok(_) => {}
            Err(err) => return Err(XmlStatusError::Xml(err)),
        }
    }
}
