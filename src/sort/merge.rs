//! K-way merge of sorted runs
//!
//! Min-heap over the head tuple of each run. Equal keys come out in run
//! order, so merging stable runs in input order keeps the sort stable.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::executor::ExecResult;
use crate::spill::{SpillFile, SpillReader, SpillWriter};
use crate::tuple::{Schema, Tuple};

/// Sequential tuple cursor over one run, holding one page at a time
pub struct RunCursor {
    reader: SpillReader,
    page: std::vec::IntoIter<Tuple>,
}

impl RunCursor {
    pub fn open(run: &SpillFile, schema: &Schema, capacity: usize) -> ExecResult<Self> {
        Ok(Self {
            reader: run.open_reader(schema, capacity)?,
            page: Vec::new().into_iter(),
        })
    }

    pub fn next_tuple(&mut self) -> ExecResult<Option<Tuple>> {
        loop {
            if let Some(tuple) = self.page.next() {
                return Ok(Some(tuple));
            }
            match self.reader.read_next()? {
                Some(page) => self.page = page.into_tuples().into_iter(),
                None => return Ok(None),
            }
        }
    }
}

struct HeapEntry {
    tuple: Tuple,
    key: usize,
    run: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap pops the greatest entry
        other
            .tuple
            .compare_at(&self.tuple, self.key)
            .then_with(|| other.run.cmp(&self.run))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// Merges `runs` into `output` and deletes the inputs.
///
/// Holds one page per input run plus the writer's output page.
pub fn merge_runs(
    runs: Vec<SpillFile>,
    key: usize,
    schema: &Schema,
    capacity: usize,
    mut output: SpillWriter,
) -> ExecResult<SpillFile> {
    let mut cursors = runs
        .iter()
        .map(|run| RunCursor::open(run, schema, capacity))
        .collect::<ExecResult<Vec<_>>>()?;

    let mut heap = BinaryHeap::with_capacity(cursors.len());
    for (run, cursor) in cursors.iter_mut().enumerate() {
        if let Some(tuple) = cursor.next_tuple()? {
            heap.push(HeapEntry { tuple, key, run });
        }
    }

    while let Some(HeapEntry { tuple, run, .. }) = heap.pop() {
        output.write_tuple(tuple)?;
        if let Some(next) = cursors[run].next_tuple()? {
            heap.push(HeapEntry {
                tuple: next,
                key,
                run,
            });
        }
    }

    let merged = output.finish()?;

    drop(cursors);
    for run in runs {
        run.remove()?;
    }
    Ok(merged)
}
