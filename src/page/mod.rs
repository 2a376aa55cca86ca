//! Pages and blocks
//!
//! # Invariants
//!
//! - A page never holds more tuples than its capacity
//! - A block never holds more pages than its capacity

mod block;
#[allow(clippy::module_inception)]
mod page;

pub use block::Block;
pub use page::{paginate, Page};
