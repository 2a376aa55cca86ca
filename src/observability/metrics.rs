//! Execution counters
//!
//! Counters only, monotonic, Relaxed ordering.

use std::sync::atomic::{AtomicU64, Ordering};

/// Registry of execution counters shared by all operators of a context
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    spill_files_created: AtomicU64,
    spill_files_deleted: AtomicU64,
    spill_pages_written: AtomicU64,
    spill_pages_read: AtomicU64,
    spill_bytes_written: AtomicU64,
    sort_runs_generated: AtomicU64,
    merge_passes: AtomicU64,
    join_tuples_emitted: AtomicU64,
    distinct_tuples_suppressed: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Spill

    pub fn increment_spill_files_created(&self) {
        self.spill_files_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_spill_files_deleted(&self) {
        self.spill_files_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one page frame written to a spill file
    pub fn record_page_written(&self, bytes: u64) {
        self.spill_pages_written.fetch_add(1, Ordering::Relaxed);
        self.spill_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_pages_read(&self) {
        self.spill_pages_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Spill files created but not yet deleted
    pub fn live_spill_files(&self) -> u64 {
        let created = self.spill_files_created.load(Ordering::Relaxed);
        let deleted = self.spill_files_deleted.load(Ordering::Relaxed);
        created.saturating_sub(deleted)
    }

    // Sort

    pub fn add_sort_runs(&self, runs: u64) {
        self.sort_runs_generated.fetch_add(runs, Ordering::Relaxed);
    }

    pub fn increment_merge_passes(&self) {
        self.merge_passes.fetch_add(1, Ordering::Relaxed);
    }

    // Join / distinct

    pub fn add_join_tuples(&self, count: u64) {
        self.join_tuples_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_distinct_suppressed(&self) {
        self.distinct_tuples_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            spill_files_created: self.spill_files_created.load(Ordering::Relaxed),
            spill_files_deleted: self.spill_files_deleted.load(Ordering::Relaxed),
            spill_pages_written: self.spill_pages_written.load(Ordering::Relaxed),
            spill_pages_read: self.spill_pages_read.load(Ordering::Relaxed),
            spill_bytes_written: self.spill_bytes_written.load(Ordering::Relaxed),
            sort_runs_generated: self.sort_runs_generated.load(Ordering::Relaxed),
            merge_passes: self.merge_passes.load(Ordering::Relaxed),
            join_tuples_emitted: self.join_tuples_emitted.load(Ordering::Relaxed),
            distinct_tuples_suppressed: self.distinct_tuples_suppressed.load(Ordering::Relaxed),
        }
    }

    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"spill_files_created":{},"spill_files_deleted":{},"spill_pages_written":{},"spill_pages_read":{},"spill_bytes_written":{},"sort_runs_generated":{},"merge_passes":{},"join_tuples_emitted":{},"distinct_tuples_suppressed":{}}}"#,
            s.spill_files_created,
            s.spill_files_deleted,
            s.spill_pages_written,
            s.spill_pages_read,
            s.spill_bytes_written,
            s.sort_runs_generated,
            s.merge_passes,
            s.join_tuples_emitted,
            s.distinct_tuples_suppressed,
        )
    }
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub spill_files_created: u64,
    pub spill_files_deleted: u64,
    pub spill_pages_written: u64,
    pub spill_pages_read: u64,
    pub spill_bytes_written: u64,
    pub sort_runs_generated: u64,
    pub merge_passes: u64,
    pub join_tuples_emitted: u64,
    pub distinct_tuples_suppressed: u64,
}
