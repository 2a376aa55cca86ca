//! aeroqp - buffer-bounded relational operators
//!
//! External merge sort, block nested-loop join, sort-merge join and
//! sort-based distinct over a paged iterator model. Intermediate data spills
//! to checksummed temporary files that each operator owns and deletes.

pub mod config;
pub mod executor;
pub mod join;
pub mod observability;
pub mod page;
pub mod sort;
pub mod spill;
pub mod tuple;
