//! Two-phase external merge sort
//!
//! Phase 1 pulls up to B pages from the child, sorts them in memory and
//! writes each batch as a run. Phase 2 merges groups of B-1 runs until one
//! run remains; that run is the output stream. A pass over R runs leaves
//! ceil(R / (B-1)), so there are ceil(log_{B-1}(R0)) passes.

use std::collections::VecDeque;

use super::merge::merge_runs;
use crate::executor::{
    check_budget, BoxedOperator, ExecContext, ExecError, ExecResult, Lifecycle, Operator,
};
use crate::observability::{Event, Severity};
use crate::page::Page;
use crate::spill::{SpillFile, SpillReader};
use crate::tuple::{Schema, Tuple};

pub struct ExternalSort {
    child: BoxedOperator,
    key: usize,
    buffer_pages: usize,
    prefix: String,
    schema: Schema,
    capacity: usize,
    runs: VecDeque<SpillFile>,
    output: Option<SpillReader>,
    initial_runs: usize,
    merge_passes: usize,
    lifecycle: Lifecycle,
    ctx: ExecContext,
}

impl ExternalSort {
    /// Sorts `child` on the field at `key`
    pub fn new(
        child: BoxedOperator,
        key: usize,
        buffer_pages: usize,
        prefix: impl Into<String>,
        ctx: &ExecContext,
    ) -> ExecResult<Self> {
        check_budget("external sort", buffer_pages)?;
        let schema = child.schema().clone();
        if key >= schema.len() {
            return Err(ExecError::schema_mismatch(format!(
                "Sort key index {} out of range for {} attributes",
                key,
                schema.len()
            )));
        }

        Ok(Self {
            child,
            key,
            buffer_pages,
            prefix: prefix.into(),
            schema,
            capacity: 0,
            runs: VecDeque::new(),
            output: None,
            initial_runs: 0,
            merge_passes: 0,
            lifecycle: Lifecycle::Created,
            ctx: ctx.clone(),
        })
    }

    /// Sorts `child` on the named attribute
    pub fn by_name(
        child: BoxedOperator,
        key: &str,
        buffer_pages: usize,
        prefix: impl Into<String>,
        ctx: &ExecContext,
    ) -> ExecResult<Self> {
        let index = child.schema().index_of(key)?;
        Self::new(child, index, buffer_pages, prefix, ctx)
    }

    pub fn key(&self) -> usize {
        self.key
    }

    /// Runs produced by phase 1 (R0)
    pub fn initial_runs(&self) -> usize {
        self.initial_runs
    }

    pub fn merge_passes(&self) -> usize {
        self.merge_passes
    }

    fn sort(&mut self) -> ExecResult<()> {
        self.capacity = self.ctx.page_capacity(&self.schema)?;

        self.child.open()?;
        self.generate_runs()?;
        self.child.close()?;

        self.initial_runs = self.runs.len();
        self.ctx.metrics().add_sort_runs(self.initial_runs as u64);

        while self.runs.len() > 1 {
            self.merge_pass()?;
        }

        if let Some(run) = self.runs.front() {
            self.output = Some(run.open_reader(&self.schema, self.capacity)?);
        }

        let initial = self.initial_runs.to_string();
        let passes = self.merge_passes.to_string();
        self.ctx.log(
            Severity::Info,
            Event::SortComplete,
            &[
                ("prefix", self.prefix.as_str()),
                ("initial_runs", initial.as_str()),
                ("merge_passes", passes.as_str()),
            ],
        );
        Ok(())
    }

    fn generate_runs(&mut self) -> ExecResult<()> {
        loop {
            let mut batch: Vec<Tuple> = Vec::new();
            let mut pages = 0;
            while pages < self.buffer_pages {
                match self.child.next()? {
                    Some(page) => {
                        batch.extend(page);
                        pages += 1;
                    }
                    None => break,
                }
            }
            if pages == 0 {
                return Ok(());
            }

            let key = self.key;
            batch.sort_by(|a, b| a.compare_at(b, key));

            let tuples = batch.len().to_string();
            let mut writer = self.ctx.create_spill(&self.prefix, &self.schema)?;
            for tuple in batch {
                writer.write_tuple(tuple)?;
            }
            self.runs.push_back(writer.finish()?);

            let run = self.runs.len().to_string();
            self.ctx.log(
                Severity::Trace,
                Event::SortRunWritten,
                &[
                    ("prefix", self.prefix.as_str()),
                    ("run", run.as_str()),
                    ("tuples", tuples.as_str()),
                ],
            );

            if pages < self.buffer_pages {
                return Ok(());
            }
        }
    }

    fn merge_pass(&mut self) -> ExecResult<()> {
        let fan_in = self.buffer_pages - 1;
        let mut merged = VecDeque::new();

        while !self.runs.is_empty() {
            let take = fan_in.min(self.runs.len());
            let group: Vec<SpillFile> = self.runs.drain(..take).collect();
            if group.len() == 1 {
                merged.extend(group);
                continue;
            }
            let writer = self.ctx.create_spill(&self.prefix, &self.schema)?;
            merged.push_back(merge_runs(
                group,
                self.key,
                &self.schema,
                self.capacity,
                writer,
            )?);
        }

        self.runs = merged;
        self.merge_passes += 1;
        self.ctx.metrics().increment_merge_passes();

        let pass = self.merge_passes.to_string();
        let remaining = self.runs.len().to_string();
        self.ctx.log(
            Severity::Trace,
            Event::SortMergePass,
            &[
                ("prefix", self.prefix.as_str()),
                ("pass", pass.as_str()),
                ("runs", remaining.as_str()),
            ],
        );
        Ok(())
    }
}

impl Operator for ExternalSort {
    fn name(&self) -> &'static str {
        "external_sort"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&mut self) -> ExecResult<()> {
        self.lifecycle.check_openable(self.name())?;
        self.lifecycle = Lifecycle::Open;
        let result = self.sort();
        self.ctx.observe(self.name(), "open", result)
    }

    fn next(&mut self) -> ExecResult<Option<Page>> {
        self.lifecycle.check_open(self.name())?;
        let Some(reader) = self.output.as_mut() else {
            return Ok(None);
        };
        let result = reader.read_next();
        let page = self.ctx.observe(self.name(), "next", result)?;
        if page.is_none() {
            self.output = None;
        }
        Ok(page)
    }

    fn close(&mut self) -> ExecResult<()> {
        if self.lifecycle == Lifecycle::Closed {
            return Ok(());
        }
        self.lifecycle = Lifecycle::Closed;
        self.output = None;

        let mut first_err = self.child.close().err();
        for run in self.runs.drain(..) {
            if let Err(e) = run.remove() {
                self.ctx.log(
                    Severity::Warn,
                    Event::SpillCleanupFailed,
                    &[("operator", "external_sort"), ("message", e.message())],
                );
                first_err.get_or_insert(e);
            }
        }

        self.ctx.log(
            Severity::Info,
            Event::OperatorClose,
            &[("operator", self.name()), ("prefix", self.prefix.as_str())],
        );
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
