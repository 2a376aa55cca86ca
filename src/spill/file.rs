//! Owned spill files
//!
//! A `SpillFile` is the only handle to its path. Removing it, or dropping
//! it, deletes the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::reader::SpillReader;
use crate::executor::{ExecError, ExecResult};
use crate::observability::MetricsRegistry;
use crate::tuple::Schema;

#[derive(Debug)]
pub struct SpillFile {
    path: PathBuf,
    pages: u64,
    tuples: u64,
    metrics: Arc<MetricsRegistry>,
    removed: bool,
}

impl SpillFile {
    /// Takes ownership of an already created file
    pub(crate) fn adopt(path: PathBuf, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            path,
            pages: 0,
            tuples: 0,
            metrics,
            removed: false,
        }
    }

    pub(crate) fn set_counts(&mut self, pages: u64, tuples: u64) {
        self.pages = pages;
        self.tuples = tuples;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of page frames written
    pub fn page_count(&self) -> u64 {
        self.pages
    }

    pub fn tuple_count(&self) -> u64 {
        self.tuples
    }

    /// Opens a fresh sequential scan from the first frame
    pub fn open_reader(&self, schema: &Schema, capacity: usize) -> ExecResult<SpillReader> {
        SpillReader::open(&self.path, schema.clone(), capacity, Arc::clone(&self.metrics))
    }

    /// Deletes the file. A file already gone counts as deleted.
    pub fn remove(mut self) -> ExecResult<()> {
        self.delete()
    }

    fn delete(&mut self) -> ExecResult<()> {
        if self.removed {
            return Ok(());
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ExecError::spill_io(
                    "Failed to delete spill file",
                    &self.path,
                    e,
                ))
            }
        }
        self.removed = true;
        self.metrics.increment_spill_files_deleted();
        Ok(())
    }
}

impl Drop for SpillFile {
    fn drop(&mut self) {
        // Drop cannot report; explicit remove() does
        let _ = self.delete();
    }
}
