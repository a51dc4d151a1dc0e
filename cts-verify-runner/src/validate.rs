// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checking a set of results against a mustpass list.

use crate::{log_parser::TestCaseResult, mustpass::Mustpass, reporter::ReportSink};
use std::collections::{HashMap, hash_map::Entry};

/// The maximum number of missing cases reported individually by one validation call.
pub const MAX_REPORTED_MISSING: usize = 20;

/// The outcome of [`validate_case_presence`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PresenceOutcome {
    /// True if any missing case, duplicate result or disallowed status was found.
    pub any_error: bool,

    /// True if every case present in the results was found at its mustpass position.
    ///
    /// Misordering is not an error by itself; callers decide whether it is.
    pub order_ok: bool,

    /// The number of mustpass cases with no result. Counts every case, including those not reported
    /// individually.
    pub missing: usize,

    /// The number of extra results for cases that already had one.
    pub duplicates: usize,

    /// The number of results with a status outside the allowed set.
    pub disallowed: usize,
}

/// Validates `results` against `mustpass`.
///
/// Missing cases, duplicate results and disallowed statuses are each reported as failures to
/// `sink`, tagged with `context`. At most [`MAX_REPORTED_MISSING`] missing cases are reported
/// individually, followed by a note if there were more.
///
/// Results for cases not in `mustpass` are ignored here.
pub fn validate_case_presence(
    sink: &mut dyn ReportSink,
    mustpass: &Mustpass,
    results: &[TestCaseResult],
    context: Option<&str>,
) -> PresenceOutcome {
    let mut outcome = PresenceOutcome {
        order_ok: true,
        ..PresenceOutcome::default()
    };

    let mut first_index = HashMap::with_capacity(results.len());
    for (index, result) in results.iter().enumerate() {
        match first_index.entry(result.name.as_str()) {
            Entry::Vacant(entry) => {
                entry.insert(index);
            }
            Entry::Occupied(_) => {
                sink.failure(&format!("Multiple results for {}", result.name), context);
                outcome.duplicates += 1;
            }
        }
    }

    for (position, case) in mustpass.iter().enumerate() {
        let Some(&index) = first_index.get(case) else {
            if outcome.missing < MAX_REPORTED_MISSING {
                sink.failure(&format!("Missing result for {case}"), context);
            }
            outcome.missing += 1;
            continue;
        };

        if index != position {
            outcome.order_ok = false;
        }

        let result = &results[index];
        if !result.status.is_allowed() {
            sink.failure(&format!("{}: {}", result.name, result.status), context);
            outcome.disallowed += 1;
        }
    }

    if outcome.missing > MAX_REPORTED_MISSING {
        sink.message(
            &format!(
                "{} more missing results found but only the first {MAX_REPORTED_MISSING} are reported",
                outcome.missing - MAX_REPORTED_MISSING,
            ),
            context,
        );
    }

    outcome.any_error = outcome.missing > 0 || outcome.duplicates > 0 || outcome.disallowed > 0;
    outcome
}
