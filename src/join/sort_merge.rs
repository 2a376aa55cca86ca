//! Sort-merge join
//!
//! Both inputs are sorted externally on their join attribute, then merged.
//! Right tuples matched by the current left tuple are parked in a replay
//! buffer. When the next left tuple carries the same key, the buffer is
//! pushed back in front of the right window so the group is paired again
//! without rereading the spill file. Merge state survives across `next()`
//! calls, so duplicate groups may span any number of output pages.
//!
//! The replay buffer holds one right duplicate group in memory.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::mem;

use super::condition::{JoinCondition, JoinKeys};
use crate::executor::{
    check_budget, BoxedOperator, ExecContext, ExecError, ExecResult, Lifecycle, Operator,
};
use crate::observability::{Event, Severity};
use crate::page::Page;
use crate::sort::ExternalSort;
use crate::tuple::{Schema, Tuple};

const LEFT_PREFIX: &str = "smj-left";
const RIGHT_PREFIX: &str = "smj-right";

/// Tuple-at-a-time view over a sorted input, one page buffered
struct SortedStream {
    sort: ExternalSort,
    window: VecDeque<Tuple>,
    exhausted: bool,
}

impl SortedStream {
    fn new(sort: ExternalSort) -> Self {
        Self {
            sort,
            window: VecDeque::new(),
            exhausted: false,
        }
    }

    fn head(&mut self) -> ExecResult<Option<&Tuple>> {
        while self.window.is_empty() && !self.exhausted {
            match self.sort.next()? {
                Some(page) => self.window.extend(page),
                None => self.exhausted = true,
            }
        }
        Ok(self.window.front())
    }

    fn pop(&mut self) -> ExecResult<Option<Tuple>> {
        self.head()?;
        Ok(self.window.pop_front())
    }

    /// Puts `tuples` back in front of the window, keeping their order
    fn unread(&mut self, tuples: Vec<Tuple>) {
        for tuple in tuples.into_iter().rev() {
            self.window.push_front(tuple);
        }
    }

    fn close(&mut self) -> ExecResult<()> {
        self.window.clear();
        self.exhausted = true;
        self.sort.close()
    }
}

struct MergeCursor {
    /// Current left tuple
    left: Tuple,
    /// Right tuples already paired with `left`'s key
    replay: Vec<Tuple>,
}

enum MergeState {
    Unopened,
    Merging(MergeCursor),
    Exhausted,
}

pub struct SortMergeJoin {
    left: SortedStream,
    right: SortedStream,
    keys: JoinKeys,
    schema: Schema,
    capacity: usize,
    state: MergeState,
    lifecycle: Lifecycle,
    ctx: ExecContext,
}

impl SortMergeJoin {
    pub fn new(
        left: BoxedOperator,
        right: BoxedOperator,
        condition: &JoinCondition,
        buffer_pages: usize,
        ctx: &ExecContext,
    ) -> ExecResult<Self> {
        check_budget("sort-merge join", buffer_pages)?;
        let keys = condition.resolve(left.schema(), right.schema())?;
        let schema = left.schema().join(right.schema());

        let left = ExternalSort::new(left, keys.left, buffer_pages, LEFT_PREFIX, ctx)?;
        let right = ExternalSort::new(right, keys.right, buffer_pages, RIGHT_PREFIX, ctx)?;

        Ok(Self {
            left: SortedStream::new(left),
            right: SortedStream::new(right),
            keys,
            schema,
            capacity: 0,
            state: MergeState::Unopened,
            lifecycle: Lifecycle::Created,
            ctx: ctx.clone(),
        })
    }

    pub fn left_sort(&self) -> &ExternalSort {
        &self.left.sort
    }

    pub fn right_sort(&self) -> &ExternalSort {
        &self.right.sort
    }

    fn start(&mut self) -> ExecResult<()> {
        self.capacity = self.ctx.page_capacity(&self.schema)?;
        self.left.sort.open()?;
        self.right.sort.open()?;

        self.state = match self.left.pop()? {
            Some(left) => MergeState::Merging(MergeCursor {
                left,
                replay: Vec::new(),
            }),
            None => MergeState::Exhausted,
        };
        Ok(())
    }

    /// Moves to the next left tuple. Returns false once the left side is done.
    fn advance_left(&mut self, cursor: &mut MergeCursor) -> ExecResult<bool> {
        let Some(next) = self.left.pop()? else {
            return Ok(false);
        };

        let same_key = next.compare_at(&cursor.left, self.keys.left) == Ordering::Equal;
        if same_key && !cursor.replay.is_empty() {
            self.right.unread(mem::take(&mut cursor.replay));
        } else {
            cursor.replay.clear();
        }
        cursor.left = next;
        Ok(true)
    }

    fn fill_page(&mut self) -> ExecResult<Option<Page>> {
        let mut cursor = match mem::replace(&mut self.state, MergeState::Exhausted) {
            MergeState::Merging(cursor) => cursor,
            MergeState::Exhausted => return Ok(None),
            MergeState::Unopened => {
                return Err(ExecError::operator_state(self.name(), "merge not started"))
            }
        };

        let mut output = Page::new(self.capacity);
        let mut done = false;

        while !output.is_full() {
            let ordering = self
                .right
                .head()?
                .map(|right| cursor.left.compare_across(right, self.keys.left, self.keys.right));

            match ordering {
                Some(Ordering::Equal) => {
                    if let Some(right) = self.right.pop()? {
                        output.push(cursor.left.join_with(&right))?;
                        cursor.replay.push(right);
                    }
                }
                Some(Ordering::Greater) => {
                    // Smaller than every remaining left key
                    self.right.pop()?;
                }
                Some(Ordering::Less) => {
                    if !self.advance_left(&mut cursor)? {
                        done = true;
                        break;
                    }
                }
                None => {
                    if cursor.replay.is_empty() || !self.advance_left(&mut cursor)? {
                        done = true;
                        break;
                    }
                }
            }
        }

        if !done {
            self.state = MergeState::Merging(cursor);
        }
        Ok(if output.is_empty() { None } else { Some(output) })
    }
}

impl Operator for SortMergeJoin {
    fn name(&self) -> &'static str {
        "sort_merge_join"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&mut self) -> ExecResult<()> {
        self.lifecycle.check_openable(self.name())?;
        self.lifecycle = Lifecycle::Open;
        let result = self.start();
        self.ctx.observe(self.name(), "open", result)?;

        let left_runs = self.left.sort.initial_runs().to_string();
        let right_runs = self.right.sort.initial_runs().to_string();
        self.ctx.log(
            Severity::Info,
            Event::OperatorOpen,
            &[
                ("operator", self.name()),
                ("left_runs", left_runs.as_str()),
                ("right_runs", right_runs.as_str()),
            ],
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
        self.state = MergeState::Exhausted;

        let left = self.left.close();
        let right = self.right.close();
        self.ctx
            .log(Severity::Info, Event::OperatorClose, &[("operator", self.name())]);
        left.and(right)
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

    fn ctx(dir: &TempDir, page_size: usize) -> ExecContext {
        ExecContext::new(
            ExecConfig::default()
                .with_spill_dir(dir.path())
                .with_page_size(page_size)
                .with_log_level(Severity::Fatal),
        )
        .unwrap()
    }

    fn side(name: &str, rows: Vec<Tuple>, ctx: &ExecContext) -> BoxedOperator {
        let schema = Schema::new(vec![
            Attribute::new(format!("{}.k", name), DataType::Int),
            Attribute::with_size(format!("{}.v", name), DataType::Text, 4),
        ]);
        Box::new(ValuesScan::new(schema, rows, ctx))
    }

    fn join(left: BoxedOperator, right: BoxedOperator, ctx: &ExecContext) -> SortMergeJoin {
        SortMergeJoin::new(left, right, &JoinCondition::new("l.k", "r.k"), 3, ctx).unwrap()
    }

    #[test]
    fn test_duplicate_groups_on_both_sides() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir, 16);
        let left = side("l", vec![tuple![1, "a"], tuple![2, "b"], tuple![1, "c"]], &ctx);
        let right = side("r", vec![tuple![1, "x"], tuple![1, "y"], tuple![3, "z"]], &ctx);
        let mut smj = join(left, right, &ctx);

        // Stable sorts keep input order within each group
        assert_eq!(
            execute(&mut smj).unwrap(),
            vec![
                tuple![1, "a", 1, "x"],
                tuple![1, "a", 1, "y"],
                tuple![1, "c", 1, "x"],
                tuple![1, "c", 1, "y"],
            ]
        );
    }

    #[test]
    fn test_group_spans_many_output_pages() {
        let dir = TempDir::new().unwrap();
        // input capacity 2, output capacity 1
        let ctx = ctx(&dir, 16);
        let left = side("l", (0..4).map(|_| tuple![5, "l"]).collect(), &ctx);
        let right = side(
            "r",
            vec![tuple![4, "r"], tuple![5, "r"], tuple![5, "r"], tuple![5, "r"], tuple![6, "r"]],
            &ctx,
        );
        let mut smj = join(left, right, &ctx);
        smj.open().unwrap();

        let mut pages = 0;
        while let Some(page) = smj.next().unwrap() {
            assert_eq!(page.len(), 1);
            pages += 1;
        }
        assert_eq!(pages, 12);
        assert!(smj.next().unwrap().is_none());
        smj.close().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_no_matches() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir, 64);
        let left = side("l", vec![tuple![1, "a"], tuple![3, "b"]], &ctx);
        let right = side("r", vec![tuple![2, "x"], tuple![4, "y"]], &ctx);
        assert!(execute(&mut join(left, right, &ctx)).unwrap().is_empty());
    }

    #[test]
    fn test_empty_left() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir, 64);
        let left = side("l", vec![], &ctx);
        let right = side("r", vec![tuple![2, "x"]], &ctx);
        assert!(execute(&mut join(left, right, &ctx)).unwrap().is_empty());
    }

    #[test]
    fn test_right_group_after_smaller_keys() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir, 16);
        let left = side("l", vec![tuple![3, "a"], tuple![3, "b"], tuple![4, "c"]], &ctx);
        let right = side(
            "r",
            vec![tuple![1, "p"], tuple![2, "q"], tuple![3, "x"], tuple![4, "y"], tuple![4, "z"]],
            &ctx,
        );
        assert_eq!(
            execute(&mut join(left, right, &ctx)).unwrap(),
            vec![
                tuple![3, "a", 3, "x"],
                tuple![3, "b", 3, "x"],
                tuple![4, "c", 4, "y"],
                tuple![4, "c", 4, "z"],
            ]
        );
    }

    #[test]
    fn test_rejects_small_budget() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir, 64);
        let err = SortMergeJoin::new(
            side("l", vec![], &ctx),
            side("r", vec![], &ctx),
            &JoinCondition::new("l.k", "r.k"),
            2,
            &ctx,
        )
        .err()
        .unwrap();
        assert_eq!(err.code(), ExecErrorCode::BufferBudget);
    }
}
