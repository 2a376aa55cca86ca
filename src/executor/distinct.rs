//! Sort-based duplicate elimination
//!
//! Materializes the whole base relation in memory, sorts it on the
//! projection attributes and drops every projection equal to the one
//! emitted just before it. The working set is not bounded by the buffer
//! budget.

use super::context::ExecContext;
use super::errors::ExecResult;
use super::operator::{BoxedOperator, Lifecycle, Operator};
use crate::observability::{Event, Severity};
use crate::page::Page;
use crate::tuple::{Schema, Tuple};

pub struct Distinct {
    base: BoxedOperator,
    key_indices: Vec<usize>,
    schema: Schema,
    sorted: Vec<Tuple>,
    position: usize,
    last_emitted: Option<Tuple>,
    capacity: usize,
    lifecycle: Lifecycle,
    ctx: ExecContext,
}

impl Distinct {
    /// Projects `base` onto `attributes`, in the given order
    pub fn new(base: BoxedOperator, attributes: &[String], ctx: &ExecContext) -> ExecResult<Self> {
        let key_indices = attributes
            .iter()
            .map(|name| base.schema().index_of(name))
            .collect::<ExecResult<Vec<_>>>()?;
        let schema = base.schema().project(attributes)?;

        Ok(Self {
            base,
            key_indices,
            schema,
            sorted: Vec::new(),
            position: 0,
            last_emitted: None,
            capacity: 0,
            lifecycle: Lifecycle::Created,
            ctx: ctx.clone(),
        })
    }

    fn materialize(&mut self) -> ExecResult<()> {
        self.capacity = self.ctx.page_capacity(&self.schema)?;

        self.base.open()?;
        let mut tuples = Vec::new();
        while let Some(page) = self.base.next()? {
            tuples.extend(page);
        }
        self.base.close()?;

        let keys = &self.key_indices;
        tuples.sort_by(|a, b| a.compare_keys(b, keys));
        self.sorted = tuples;
        Ok(())
    }

    fn fill_page(&mut self) -> ExecResult<Option<Page>> {
        let mut page = Page::new(self.capacity);
        while !page.is_full() && self.position < self.sorted.len() {
            let projected = self.sorted[self.position].project(&self.key_indices);
            self.position += 1;

            if self.last_emitted.as_ref() == Some(&projected) {
                self.ctx.metrics().increment_distinct_suppressed();
                continue;
            }

            self.last_emitted = Some(projected.clone());
            page.push(projected)?;
        }

        if self.position >= self.sorted.len() {
            // Release the materialization as soon as it is consumed
            self.sorted = Vec::new();
            self.position = 0;
        }

        Ok(if page.is_empty() { None } else { Some(page) })
    }
}

impl Operator for Distinct {
    fn name(&self) -> &'static str {
        "distinct"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&mut self) -> ExecResult<()> {
        self.lifecycle.check_openable(self.name())?;
        self.lifecycle = Lifecycle::Open;
        let result = self.materialize();
        self.ctx.observe(self.name(), "open", result)?;

        let tuples = self.sorted.len().to_string();
        self.ctx.log(
            Severity::Info,
            Event::OperatorOpen,
            &[("operator", self.name()), ("tuples", tuples.as_str())],
        );
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Page>> {
        self.lifecycle.check_open(self.name())?;
        self.fill_page()
    }

    fn close(&mut self) -> ExecResult<()> {
        if self.lifecycle == Lifecycle::Closed {
            return Ok(());
        }
        self.lifecycle = Lifecycle::Closed;
        self.sorted = Vec::new();
        self.last_emitted = None;
        let result = self.base.close();
        self.ctx.log(Severity::Info, Event::OperatorClose, &[("operator", self.name())]);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecConfig;
    use crate::executor::{execute, ExecErrorCode, ValuesScan};
    use crate::tuple;
    use crate::tuple::{Attribute, DataType};
    use tempfile::TempDir;

    fn ctx(dir: &TempDir) -> ExecContext {
        ExecContext::new(
            ExecConfig::default()
                .with_spill_dir(dir.path())
                .with_page_size(8)
                .with_log_level(Severity::Fatal),
        )
        .unwrap()
    }

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::new("r.a", DataType::Int),
            Attribute::with_size("r.b", DataType::Text, 4),
        ])
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_project_single_column() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir);
        let base = ValuesScan::new(
            schema(),
            vec![tuple![1, "a"], tuple![1, "b"], tuple![2, "a"]],
            &ctx,
        );
        let mut distinct = Distinct::new(Box::new(base), &names(&["r.a"]), &ctx).unwrap();

        assert_eq!(distinct.schema().len(), 1);
        assert_eq!(execute(&mut distinct).unwrap(), vec![tuple![1], tuple![2]]);
        assert_eq!(ctx.metrics().snapshot().distinct_tuples_suppressed, 1);
    }

    #[test]
    fn test_multi_key_projection_order() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir);
        let base = ValuesScan::new(
            schema(),
            vec![tuple![2, "x"], tuple![1, "y"], tuple![2, "x"], tuple![1, "x"]],
            &ctx,
        );
        let mut distinct = Distinct::new(Box::new(base), &names(&["r.b", "r.a"]), &ctx).unwrap();

        assert_eq!(
            execute(&mut distinct).unwrap(),
            vec![tuple!["x", 1], tuple!["x", 2], tuple!["y", 1]]
        );
    }

    #[test]
    fn test_duplicates_spanning_pages() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir);
        let int_schema = Schema::new(vec![Attribute::new("r.a", DataType::Int)]);
        // capacity 2; ten copies of each value
        let tuples = (0..30).map(|i| tuple![i % 3]).collect();
        let base = ValuesScan::new(int_schema, tuples, &ctx);
        let mut distinct = Distinct::new(Box::new(base), &names(&["r.a"]), &ctx).unwrap();

        assert_eq!(
            execute(&mut distinct).unwrap(),
            vec![tuple![0], tuple![1], tuple![2]]
        );
    }

    #[test]
    fn test_unknown_attribute() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir);
        let base = ValuesScan::new(schema(), vec![], &ctx);
        let err = Distinct::new(Box::new(base), &names(&["r.zzz"]), &ctx)
            .err()
            .unwrap();
        assert_eq!(err.code(), ExecErrorCode::SchemaMismatch);
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir);
        let base = ValuesScan::new(schema(), vec![tuple![1, "a"]], &ctx);
        let mut distinct = Distinct::new(Box::new(base), &names(&["r.a"]), &ctx).unwrap();
        distinct.open().unwrap();
        distinct.close().unwrap();
        distinct.close().unwrap();
    }
}
