//! Batch diagnostics.
//!
//! No logging dependency sits anywhere in this workspace; the answer to
//! "how does a caller see what went wrong across many operations" is a
//! plain accumulated, structured message list with a `Display` impl, not a
//! `tracing` span tree. This module is sized to §7's batch-reporting policy:
//! "errors accumulate per batch when transforming many classes and are
//! reported together with one line per failure listing class name,
//! operation, and underlying cause."

use crate::error::InstrumentationError;
use std::fmt;

/// One failure encountered while processing a batch of classes.
#[derive(Debug, Clone)]
pub struct FailureEntry {
    pub class_name: String,
    pub operation: &'static str,
    pub cause: InstrumentationError,
}

impl fmt::Display for FailureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.class_name, self.operation, self.cause)
    }
}

/// An accumulated set of per-class failures from a single batch transform.
///
/// Never produced as a substitute for success: if a tree would only
/// partially mutate before failing, the engine discards that tree and
/// records the failure here instead (§7: "the engine never partially
/// mutates a tree and then returns success").
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    failures: Vec<FailureEntry>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, class_name: impl Into<String>, operation: &'static str, cause: InstrumentationError) {
        self.failures.push(FailureEntry {
            class_name: class_name.into(),
            operation,
            cause,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[FailureEntry] {
        &self.failures
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InstrumentationError, ShapeError};

    #[test]
    fn empty_report_has_no_failures() {
        let report = BatchReport::new();
        assert!(report.is_empty());
        assert_eq!(format!("{report}"), "");
    }

    #[test]
    fn records_one_line_per_failure() {
        let mut report = BatchReport::new();
        report.record(
            "pkg.Foo",
            "instrument",
            InstrumentationError::Shape(ShapeError::AbstractMethodIntercepted { signature: "call()V".into() }),
        );
        report.record(
            "pkg.Bar",
            "instrument",
            InstrumentationError::Shape(ShapeError::DuplicateInstrumentation { class_name: "pkg.Bar".into() }),
        );
        assert_eq!(report.len(), 2);
        let rendered = format!("{report}");
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.lines().next().unwrap().starts_with("pkg.Foo: instrument:"));
    }
}
