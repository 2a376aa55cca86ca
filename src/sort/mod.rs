//! External multiway merge sort

mod external;
mod merge;

pub use external::ExternalSort;
pub use merge::{merge_runs, RunCursor};
