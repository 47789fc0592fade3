//! # Check Results
//!
//! `CheckResult` is the uniform reporting unit of every verification stage.
//! Results are collected into a [`RunReport`] in stage order; the overall
//! [`Verdict`] is PASS iff every result is `ok`.
//!
//! Detail strings are bounded: [`summarize`] shows the first N offending
//! items and always states the true total, with an explicit `...and N more`
//! when items were elided.

use std::fmt;

use serde::Serialize;

/// Outcome of one verification stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Stage name, e.g. `manifest.verify`.
    pub name: String,
    /// Whether the stage passed.
    pub ok: bool,
    /// Human-readable detail. For failures, a bounded list of offenders.
    pub details: String,
}

impl CheckResult {
    /// A passing result.
    pub fn pass(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: true,
            details: details.into(),
        }
    }

    /// A failing result.
    pub fn fail(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: false,
            details: details.into(),
        }
    }

    /// `PASS` or `FAIL`.
    pub fn status(&self) -> &'static str {
        if self.ok {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.status(), self.name)
    }
}

/// Render a bounded summary of `items`.
///
/// Produces `"{label} ({total}): a; b; c"` and appends `; ...and {n} more`
/// when more than `limit` items exist.
pub fn summarize<T: fmt::Display>(label: &str, items: &[T], limit: usize, separator: &str) -> String {
    let shown: Vec<String> = items.iter().take(limit).map(ToString::to_string).collect();
    let mut out = format!("{label} ({}): {}", items.len(), shown.join(separator));
    if items.len() > limit {
        out.push_str(separator);
        out.push_str(&format!("...and {} more", items.len() - limit));
    }
    out
}

/// Overall verdict of a run, with its process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// Every stage passed.
    Pass,
    /// At least one stage found a content inconsistency.
    Fail,
    /// The run could not proceed (configuration error).
    Misconfig,
}

impl Verdict {
    /// `0` PASS, `1` FAIL, `2` MISCONFIG.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
            Self::Misconfig => 2,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Misconfig => "MISCONFIG",
        })
    }
}

/// Ordered collection of stage results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    results: Vec<CheckResult>,
}

impl RunReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage result.
    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// Stage results in execution order.
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Look up a stage result by name.
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// PASS iff every stage passed.
    pub fn verdict(&self) -> Verdict {
        if self.results.iter().all(|r| r.ok) {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}
