//! Sequential spill writer
//!
//! Tuples are buffered into one page of the writer's capacity and flushed
//! as a frame whenever that page fills. `finish()` hands back the owned
//! file; dropping an unfinished writer deletes the partial file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use super::codec::encode_page;
use super::file::SpillFile;
use crate::executor::{ExecError, ExecResult};
use crate::observability::MetricsRegistry;
use crate::page::Page;
use crate::tuple::{Schema, Tuple};

pub struct SpillWriter {
    // Declared before `file` so buffered bytes are dropped before deletion
    writer: BufWriter<File>,
    file: SpillFile,
    schema: Schema,
    pending: Page,
    pages: u64,
    tuples: u64,
    metrics: Arc<MetricsRegistry>,
}

impl SpillWriter {
    /// Creates a new spill file. Fails if the path already exists.
    pub fn create(
        path: PathBuf,
        schema: Schema,
        capacity: usize,
        metrics: Arc<MetricsRegistry>,
    ) -> ExecResult<Self> {
        let handle = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ExecError::spill_io("Failed to create spill file", &path, e))?;
        metrics.increment_spill_files_created();

        Ok(Self {
            writer: BufWriter::new(handle),
            file: SpillFile::adopt(path, Arc::clone(&metrics)),
            schema,
            pending: Page::new(capacity),
            pages: 0,
            tuples: 0,
            metrics,
        })
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    pub fn write_tuple(&mut self, tuple: Tuple) -> ExecResult<()> {
        if self.pending.is_full() {
            self.flush_pending()?;
        }
        self.pending.push(tuple)
    }

    /// Writes every tuple of `page`, regrouped to this writer's capacity
    pub fn write_page(&mut self, page: Page) -> ExecResult<()> {
        for tuple in page {
            self.write_tuple(tuple)?;
        }
        Ok(())
    }

    /// Tuples written so far, including the unflushed page
    pub fn tuple_count(&self) -> u64 {
        self.tuples + self.pending.len() as u64
    }

    /// Flushes the last page and returns the owned file
    pub fn finish(mut self) -> ExecResult<SpillFile> {
        self.flush_pending()?;
        self.writer.flush().map_err(|e| {
            ExecError::spill_io("Failed to flush spill file", self.file.path(), e)
        })?;

        let SpillWriter {
            writer,
            mut file,
            pages,
            tuples,
            ..
        } = self;
        drop(writer);
        file.set_counts(pages, tuples);
        Ok(file)
    }

    fn flush_pending(&mut self) -> ExecResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let capacity = self.pending.capacity();
        let page = std::mem::replace(&mut self.pending, Page::new(capacity));
        let frame = encode_page(&page, &self.schema)?;

        self.writer.write_all(&frame).map_err(|e| {
            ExecError::spill_io("Failed to write spill page", self.file.path(), e)
        })?;

        self.pages += 1;
        self.tuples += page.len() as u64;
        self.metrics.record_page_written(frame.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple;
    use crate::tuple::{Attribute, DataType};
    use tempfile::TempDir;

    fn schema() -> Schema {
        Schema::new(vec![Attribute::new("t.k", DataType::Int)])
    }

    #[test]
    fn test_pages_split_at_capacity() {
        let dir = TempDir::new().unwrap();
        let metrics = Arc::new(MetricsRegistry::new());
        let mut writer = SpillWriter::create(
            dir.path().join("w.spill"),
            schema(),
            3,
            Arc::clone(&metrics),
        )
        .unwrap();

        for i in 0..7 {
            writer.write_tuple(tuple![i]).unwrap();
        }
        let file = writer.finish().unwrap();

        assert_eq!(file.page_count(), 3);
        assert_eq!(file.tuple_count(), 7);
        assert_eq!(metrics.snapshot().spill_pages_written, 3);
        assert_eq!(metrics.snapshot().spill_files_created, 1);
    }

    #[test]
    fn test_unfinished_writer_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.spill");
        let metrics = Arc::new(MetricsRegistry::new());
        {
            let mut writer =
                SpillWriter::create(path.clone(), schema(), 2, Arc::clone(&metrics)).unwrap();
            for i in 0..5 {
                writer.write_tuple(tuple![i]).unwrap();
            }
            assert!(path.exists());
        }
        assert!(!path.exists());
        assert_eq!(metrics.live_spill_files(), 0);
    }

    #[test]
    fn test_create_refuses_existing_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken.spill");
        std::fs::write(&path, b"").unwrap();
        let result = SpillWriter::create(path, schema(), 2, Arc::new(MetricsRegistry::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_writer_produces_empty_file() {
        let dir = TempDir::new().unwrap();
        let writer = SpillWriter::create(
            dir.path().join("empty.spill"),
            schema(),
            2,
            Arc::new(MetricsRegistry::new()),
        )
        .unwrap();
        let file = writer.finish().unwrap();
        assert_eq!(file.page_count(), 0);
        assert_eq!(std::fs::metadata(file.path()).unwrap().len(), 0);
    }
}
