//! The paged iterator contract
//!
//! Every operator is driven by its parent: `open()` once, `next()` until it
//! returns `None`, then `close()`. `close()` may be called at any point,
//! any number of times, and releases every spill file the operator owns.

use super::errors::{ExecError, ExecResult};
use crate::page::Page;
use crate::tuple::{Schema, Tuple};

pub trait Operator {
    /// Short stable name used in logs and errors
    fn name(&self) -> &'static str;

    /// Output schema, available before `open()`
    fn schema(&self) -> &Schema;

    fn open(&mut self) -> ExecResult<()>;

    /// Next non-empty page, or `None` once exhausted. Stays `None`.
    fn next(&mut self) -> ExecResult<Option<Page>>;

    /// Releases resources. Idempotent.
    fn close(&mut self) -> ExecResult<()>;
}

pub type BoxedOperator = Box<dyn Operator>;

impl<O: Operator + ?Sized> Operator for Box<O> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn open(&mut self) -> ExecResult<()> {
        (**self).open()
    }

    fn next(&mut self) -> ExecResult<Option<Page>> {
        (**self).next()
    }

    fn close(&mut self) -> ExecResult<()> {
        (**self).close()
    }
}

/// Where an operator is in its open/next/close contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Open,
    Closed,
}

impl Lifecycle {
    /// Fails unless `open()` may be called now
    pub fn check_openable(self, operator: &str) -> ExecResult<()> {
        match self {
            Lifecycle::Created => Ok(()),
            Lifecycle::Open => Err(ExecError::operator_state(operator, "open() called twice")),
            Lifecycle::Closed => Err(ExecError::operator_state(
                operator,
                "open() called after close()",
            )),
        }
    }

    /// Fails unless `next()` may be called now
    pub fn check_open(self, operator: &str) -> ExecResult<()> {
        match self {
            Lifecycle::Open => Ok(()),
            Lifecycle::Created => Err(ExecError::operator_state(
                operator,
                "next() called before open()",
            )),
            Lifecycle::Closed => Err(ExecError::operator_state(
                operator,
                "next() called after close()",
            )),
        }
    }
}

/// Opens `root`, drains it and closes it.
///
/// `close()` runs even when `open()` or `next()` fails; the first error wins.
pub fn execute(root: &mut dyn Operator) -> ExecResult<Vec<Tuple>> {
    let result = drain(root);
    let closed = root.close();
    let tuples = result?;
    closed?;
    Ok(tuples)
}

fn drain(root: &mut dyn Operator) -> ExecResult<Vec<Tuple>> {
    root.open()?;
    let mut tuples = Vec::new();
    while let Some(page) = root.next()? {
        tuples.extend(page);
    }
    Ok(tuples)
}
