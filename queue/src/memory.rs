//! In-memory repair queue. A single `RwLock` over the row map makes every
//! batch upsert atomic, which is the contract the checker depends on.

use crate::{InjuredSegment, QueueError, RepairQueue, Result};
use satellite_sdk::segment::SegmentPosition;
use satellite_sdk::stream_id::StreamId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryRepairQueue {
    rows: RwLock<HashMap<(StreamId, u64), InjuredSegment>>,
    // Test hook: makes every write fail until cleared.
    fail_writes: AtomicBool,
}

impl MemoryRepairQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces subsequent writes to fail; used to exercise the checker's
    /// queue-failure path.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn get(&self, stream_id: StreamId, position: SegmentPosition) -> Option<InjuredSegment> {
        self.rows
            .read()
            .unwrap()
            .get(&(stream_id, position.encode()))
            .cloned()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            Err(QueueError::Write("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RepairQueue for MemoryRepairQueue {
    fn insert_batch(&self, batch: &[InjuredSegment]) -> Result<()> {
        self.check_writable()?;
        let mut rows = self.rows.write().unwrap();
        for row in batch {
            let key = (row.stream_id, row.position.encode());
            match rows.get_mut(&key) {
                Some(existing) => {
                    existing.segment_health = row.segment_health;
                    existing.placement = row.placement;
                    existing.scan_id = row.scan_id;
                    existing.updated_at = row.updated_at;
                }
                None => {
                    rows.insert(key, row.clone());
                }
            }
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.rows.read().unwrap().len())
    }

    fn select_n(&self, n: usize) -> Result<Vec<InjuredSegment>> {
        let rows = self.rows.read().unwrap();
        let mut selected: Vec<InjuredSegment> = rows.values().cloned().collect();
        selected.sort_by(|a, b| {
            a.segment_health
                .partial_cmp(&b.segment_health)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.inserted_at.cmp(&b.inserted_at))
        });
        selected.truncate(n);
        Ok(selected)
    }

    fn clean(&self, scan_id: u64) -> Result<usize> {
        self.check_writable()?;
        let mut rows = self.rows.write().unwrap();
        let before = rows.len();
        rows.retain(|_, row| row.scan_id >= scan_id);
        Ok(before - rows.len())
    }

    fn delete(&self, stream_id: StreamId, position: SegmentPosition) -> Result<()> {
        self.check_writable()?;
        self.rows
            .write()
            .unwrap()
            .remove(&(stream_id, position.encode()));
        Ok(())
    }
}
