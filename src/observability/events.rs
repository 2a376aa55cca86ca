//! Operator lifecycle events

use std::fmt;

/// Observable events during operator execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Operator opened and ready to produce pages
    OperatorOpen,
    /// Operator closed and its spill files released
    OperatorClose,
    /// Operator returned a failure from open/next
    OperatorFailed,
    /// External sort wrote an initial run
    SortRunWritten,
    /// External sort finished one merge pass
    SortMergePass,
    /// External sort produced its single output run
    SortComplete,
    /// A relation was fully written to a spill file
    SpillMaterialized,
    /// A spill file could not be deleted
    SpillCleanupFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::OperatorOpen => "OPERATOR_OPEN",
            Event::OperatorClose => "OPERATOR_CLOSE",
            Event::OperatorFailed => "OPERATOR_FAILED",
            Event::SortRunWritten => "SORT_RUN_WRITTEN",
            Event::SortMergePass => "SORT_MERGE_PASS",
            Event::SortComplete => "SORT_COMPLETE",
            Event::SpillMaterialized => "SPILL_MATERIALIZED",
            Event::SpillCleanupFailed => "SPILL_CLEANUP_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
