//! Block nested-loop join
//!
//! The right input is materialized once into a spill file. The left input
//! is consumed B-2 pages at a time; each block is probed against a full
//! sequential rescan of the right spill file. One page is left for the
//! right scan and one for output.

use std::cmp::Ordering;
use std::mem;

use super::condition::{JoinCondition, JoinKeys};
use crate::executor::{
    check_budget, BoxedOperator, ExecContext, ExecError, ExecResult, Lifecycle, Operator,
};
use crate::observability::{Event, Severity};
use crate::page::{Block, Page};
use crate::spill::{SpillFile, SpillReader};
use crate::tuple::Schema;

const RIGHT_PREFIX: &str = "bnlj-right";

enum ScanState {
    /// Next call loads a fresh left block
    LoadLeftBlock,
    /// Probing `block` against the right spill file
    ScanRight {
        block: Block,
        reader: SpillReader,
        /// Current right page; `None` means read the next one
        page: Option<Page>,
        /// Next unvisited (block row, page row) pair
        left_row: usize,
        right_row: usize,
    },
    Exhausted,
}

pub struct BlockNestedLoopJoin {
    left: BoxedOperator,
    right: BoxedOperator,
    keys: JoinKeys,
    buffer_pages: usize,
    schema: Schema,
    right_schema: Schema,
    right_capacity: usize,
    capacity: usize,
    right_spill: Option<SpillFile>,
    state: ScanState,
    right_scans: usize,
    lifecycle: Lifecycle,
    ctx: ExecContext,
}

impl BlockNestedLoopJoin {
    pub fn new(
        left: BoxedOperator,
        right: BoxedOperator,
        condition: &JoinCondition,
        buffer_pages: usize,
        ctx: &ExecContext,
    ) -> ExecResult<Self> {
        check_budget("block nested-loop join", buffer_pages)?;
        let keys = condition.resolve(left.schema(), right.schema())?;
        let schema = left.schema().join(right.schema());
        let right_schema = right.schema().clone();

        Ok(Self {
            left,
            right,
            keys,
            buffer_pages,
            schema,
            right_schema,
            right_capacity: 0,
            capacity: 0,
            right_spill: None,
            state: ScanState::LoadLeftBlock,
            right_scans: 0,
            lifecycle: Lifecycle::Created,
            ctx: ctx.clone(),
        })
    }

    /// Number of full rescans of the right spill file so far
    pub fn right_scans(&self) -> usize {
        self.right_scans
    }

    /// Left pages per block
    pub fn block_pages(&self) -> usize {
        self.buffer_pages - 2
    }

    fn materialize_right(&mut self) -> ExecResult<()> {
        self.capacity = self.ctx.page_capacity(&self.schema)?;
        self.right_capacity = self.ctx.page_capacity(&self.right_schema)?;

        self.right.open()?;
        let mut writer = self.ctx.create_spill(RIGHT_PREFIX, &self.right_schema)?;
        while let Some(page) = self.right.next()? {
            writer.write_page(page)?;
        }
        let spill = writer.finish()?;
        self.right.close()?;

        let pages = spill.page_count().to_string();
        let tuples = spill.tuple_count().to_string();
        self.ctx.log(
            Severity::Trace,
            Event::SpillMaterialized,
            &[
                ("operator", "block_nested_loop_join"),
                ("pages", pages.as_str()),
                ("tuples", tuples.as_str()),
            ],
        );

        if spill.tuple_count() == 0 {
            // Nothing can match
            self.state = ScanState::Exhausted;
        }
        self.right_spill = Some(spill);

        self.left.open()
    }

    fn load_block(&mut self) -> ExecResult<Block> {
        let mut block = Block::new(self.block_pages());
        while !block.is_full() {
            match self.left.next()? {
                Some(page) => block.add_page(page).map_err(|_| {
                    ExecError::buffer_budget("Left block overflow while loading pages")
                })?,
                None => break,
            }
        }
        Ok(block)
    }

    fn open_right_scan(&mut self) -> ExecResult<SpillReader> {
        let spill = self.right_spill.as_ref().ok_or_else(|| {
            ExecError::operator_state("block_nested_loop_join", "right input not materialized")
        })?;
        let reader = spill.open_reader(&self.right_schema, self.right_capacity)?;
        self.right_scans += 1;
        Ok(reader)
    }

    fn fill_page(&mut self) -> ExecResult<Option<Page>> {
        let mut output = Page::new(self.capacity);

        loop {
            match mem::replace(&mut self.state, ScanState::Exhausted) {
                ScanState::Exhausted => break,
                ScanState::LoadLeftBlock => {
                    let block = self.load_block()?;
                    if block.is_empty() {
                        break;
                    }
                    let reader = self.open_right_scan()?;
                    self.state = ScanState::ScanRight {
                        block,
                        reader,
                        page: None,
                        left_row: 0,
                        right_row: 0,
                    };
                }
                ScanState::ScanRight {
                    block,
                    mut reader,
                    page,
                    mut left_row,
                    mut right_row,
                } => {
                    let page = match page {
                        Some(page) => page,
                        None => match reader.read_next()? {
                            Some(page) => page,
                            None => {
                                self.state = ScanState::LoadLeftBlock;
                                continue;
                            }
                        },
                    };

                    while left_row < block.len() {
                        let Some(left) = block.get(left_row) else { break };
                        while right_row < page.len() {
                            let Some(right) = page.get(right_row) else { break };
                            right_row += 1;
                            if left.compare_across(right, self.keys.left, self.keys.right)
                                != Ordering::Equal
                            {
                                continue;
                            }
                            output.push(left.join_with(right))?;
                            if output.is_full() {
                                self.state = ScanState::ScanRight {
                                    block,
                                    reader,
                                    page: Some(page),
                                    left_row,
                                    right_row,
                                };
                                return Ok(Some(output));
                            }
                        }
                        right_row = 0;
                        left_row += 1;
                    }

                    self.state = ScanState::ScanRight {
                        block,
                        reader,
                        page: None,
                        left_row: 0,
                        right_row: 0,
                    };
                }
            }
        }

        Ok(if output.is_empty() { None } else { Some(output) })
    }
}

impl Operator for BlockNestedLoopJoin {
    fn name(&self) -> &'static str {
        "block_nested_loop_join"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&mut self) -> ExecResult<()> {
        self.lifecycle.check_openable(self.name())?;
        self.lifecycle = Lifecycle::Open;
        let result = self.materialize_right();
        self.ctx.observe(self.name(), "open", result)?;

        let budget = self.buffer_pages.to_string();
        self.ctx.log(
            Severity::Info,
            Event::OperatorOpen,
            &[("operator", self.name()), ("buffer_pages", budget.as_str())],
        );
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Page>> {
        self.lifecycle.check_open(self.name())?;
        let result = self.fill_page();
        let page = self.ctx.observe(self.name(), "next", result)?;
        if let Some(ref page) = page {
            self.ctx.metrics().add_join_tuples(page.len() as u64);
        }
        Ok(page)
    }

    fn close(&mut self) -> ExecResult<()> {
        if self.lifecycle == Lifecycle::Closed {
            return Ok(());
        }
        self.lifecycle = Lifecycle::Closed;
        self.state = ScanState::Exhausted;

        let left = self.left.close();
        let right = self.right.close();
        let spill = match self.right_spill.take() {
            Some(spill) => spill.remove(),
            None => Ok(()),
        };

        let scans = self.right_scans.to_string();
        self.ctx.log(
            Severity::Info,
            Event::OperatorClose,
            &[("operator", self.name()), ("right_scans", scans.as_str())],
        );
        left.and(right).and(spill)
    }
}
