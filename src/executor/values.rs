//! In-memory leaf operator
//!
//! Replays an owned tuple list page by page. Drivers and tests use it to
//! feed relations into the operator tree.

use super::context::ExecContext;
use super::errors::ExecResult;
use super::operator::{Lifecycle, Operator};
use crate::observability::{Event, Severity};
use crate::page::Page;
use crate::tuple::{Schema, Tuple};

pub struct ValuesScan {
    schema: Schema,
    tuples: Vec<Tuple>,
    position: usize,
    capacity: usize,
    lifecycle: Lifecycle,
    ctx: ExecContext,
}

impl ValuesScan {
    pub fn new(schema: Schema, tuples: Vec<Tuple>, ctx: &ExecContext) -> Self {
        Self {
            schema,
            tuples,
            position: 0,
            capacity: 0,
            lifecycle: Lifecycle::Created,
            ctx: ctx.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl Operator for ValuesScan {
    fn name(&self) -> &'static str {
        "values"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&mut self) -> ExecResult<()> {
        self.lifecycle.check_openable(self.name())?;
        let capacity = self.ctx.page_capacity(&self.schema);
        self.capacity = self.ctx.observe(self.name(), "open", capacity)?;
        self.position = 0;
        self.lifecycle = Lifecycle::Open;
        let tuples = self.tuples.len().to_string();
        self.ctx.log(
            Severity::Trace,
            Event::OperatorOpen,
            &[("operator", self.name()), ("tuples", tuples.as_str())],
        );
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Page>> {
        self.lifecycle.check_open(self.name())?;
        if self.position >= self.tuples.len() {
            return Ok(None);
        }

        let end = (self.position + self.capacity).min(self.tuples.len());
        let mut page = Page::new(self.capacity);
        for tuple in &self.tuples[self.position..end] {
            page.push(tuple.clone())?;
        }
        self.position = end;
        Ok(Some(page))
    }

    fn close(&mut self) -> ExecResult<()> {
        self.lifecycle = Lifecycle::Closed;
        Ok(())
    }
}
