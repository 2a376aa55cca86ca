//! Observability for operator execution
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Counters-only metrics
//!
//! Observability is read-only: it never changes what an operator produces,
//! and a failed log write never fails an operator.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
