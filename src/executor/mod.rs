//! Operator execution core
//!
//! Pull-based, single-threaded, page-at-a-time execution. The parent drives
//! progress with `next()`; `close()` releases spill files bottom-up and is
//! safe at any point, including after a failure.

mod context;
mod distinct;
mod errors;
mod operator;
mod values;

pub use context::{check_budget, ExecContext};
pub use distinct::Distinct;
pub use errors::{ExecError, ExecErrorCode, ExecResult, Severity as ErrorSeverity};
pub use operator::{execute, BoxedOperator, Lifecycle, Operator};
pub use values::ValuesScan;
