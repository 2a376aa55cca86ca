//! Sequential spill reader
//!
//! Reads one frame per call. Every frame is checksum-verified; any
//! truncation or mismatch is AERO_PAGE_CORRUPTION with the frame offset.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::codec::{decode_frame, MIN_FRAME_SIZE};
use crate::executor::{ExecError, ExecResult};
use crate::observability::MetricsRegistry;
use crate::page::Page;
use crate::tuple::Schema;

pub struct SpillReader {
    path: PathBuf,
    reader: BufReader<File>,
    schema: Schema,
    capacity: usize,
    offset: u64,
    file_size: u64,
    metrics: Arc<MetricsRegistry>,
}

impl SpillReader {
    pub fn open(
        path: &Path,
        schema: Schema,
        capacity: usize,
        metrics: Arc<MetricsRegistry>,
    ) -> ExecResult<Self> {
        let file = File::open(path)
            .map_err(|e| ExecError::spill_io("Failed to open spill file", path, e))?;
        let file_size = file
            .metadata()
            .map_err(|e| ExecError::spill_io("Failed to read spill metadata", path, e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            schema,
            capacity,
            offset: 0,
            file_size,
            metrics,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next frame
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the next page.
    ///
    /// - `Ok(Some(page))` for a verified frame
    /// - `Ok(None)` at end of file
    /// - `Err(AERO_PAGE_CORRUPTION)` for a bad frame
    pub fn read_next(&mut self) -> ExecResult<Option<Page>> {
        if self.offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.offset;
        if remaining < MIN_FRAME_SIZE as u64 {
            return Err(ExecError::page_corruption(
                &self.path,
                self.offset,
                format!(
                    "Truncated spill file: {} bytes remaining, minimum frame is {}",
                    remaining, MIN_FRAME_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            ExecError::page_corruption(
                &self.path,
                self.offset,
                format!("Failed to read frame length: {}", e),
            )
        })?;
        let frame_len = u32::from_le_bytes(len_buf) as u64;

        if frame_len < MIN_FRAME_SIZE as u64 || frame_len > remaining {
            return Err(ExecError::page_corruption(
                &self.path,
                self.offset,
                format!(
                    "Invalid frame length {} with {} bytes remaining",
                    frame_len, remaining
                ),
            ));
        }

        let mut frame = vec![0u8; frame_len as usize];
        frame[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut frame[4..]).map_err(|e| {
            ExecError::page_corruption(
                &self.path,
                self.offset,
                format!("Failed to read frame body: {}", e),
            )
        })?;

        let page = decode_frame(&frame, &self.schema, self.capacity)
            .map_err(|e| e.at_frame(&self.path, self.offset))?;

        self.offset += frame_len;
        self.metrics.increment_pages_read();
        Ok(Some(page))
    }
}
