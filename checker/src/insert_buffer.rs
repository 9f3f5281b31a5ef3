//! Per-fork batching in front of the repair queue: inserts coalesce into
//! size-bounded bulk upserts so a scan does not pay one queue round-trip per
//! injured segment.

use satellite_queue::{InjuredSegment, RepairQueue, Result};
use std::sync::Arc;

pub struct InsertBuffer {
    queue: Arc<dyn RepairQueue>,
    batch: Vec<InjuredSegment>,
    batch_size: usize,
}

impl InsertBuffer {
    pub fn new(queue: Arc<dyn RepairQueue>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            queue,
            batch: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Appends a row, flushing when the batch is full. On error the buffered
    /// rows are kept so the caller can retry or discard.
    pub fn insert(&mut self, row: InjuredSegment) -> Result<()> {
        self.batch.push(row);
        if self.batch.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes any buffered rows.
    pub fn flush(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.queue.insert_batch(&self.batch)?;
        self.batch.clear();
        Ok(())
    }

    /// Drops buffered rows without writing them; used on cancellation and
    /// after a write failure, so a partial scan cannot pollute the queue.
    pub fn discard(&mut self) -> usize {
        let dropped = self.batch.len();
        self.batch.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}
