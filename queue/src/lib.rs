//! The `satellite-queue` library defines the repair-queue contract shared by
//! the repair checker (producer) and the repair worker (consumer), plus an
//! in-memory implementation used by tests and single-process deployments.
//!
//! The backing store must upsert atomically per (stream-id, position); the
//! checker relies on that to stay idempotent when the same segment is
//! processed twice within one scan.

pub mod memory;

#[macro_use]
extern crate serde_derive;

use satellite_sdk::placement::Placement;
use satellite_sdk::segment::SegmentPosition;
use satellite_sdk::stream_id::StreamId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue write failed: {0}")]
    Write(String),

    #[error("queue read failed: {0}")]
    Read(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// One row of the repair queue. Primary key: (stream_id, position).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InjuredSegment {
    pub stream_id: StreamId,
    pub position: SegmentPosition,
    pub placement: Placement,
    /// Lower value means repair sooner.
    pub segment_health: f64,
    /// Milliseconds since the epoch; preserved across updates.
    pub inserted_at: u64,
    /// Milliseconds since the epoch; refreshed on every upsert.
    pub updated_at: u64,
    /// Times the repair worker has picked this row up; preserved across
    /// updates, maintained by the worker.
    pub attempt_count: u32,
    /// Id of the catalog scan that last saw this segment unhealthy.
    pub scan_id: u64,
}

/// Storage contract for injured segments.
///
/// `insert_batch` upserts: a new key keeps the row's `inserted_at` and
/// `attempt_count`, an existing key keeps its own and takes the incoming
/// health, placement, scan id, and `updated_at`. Later writes win.
pub trait RepairQueue: Send + Sync {
    fn insert_batch(&self, rows: &[InjuredSegment]) -> Result<()>;

    /// Total injured segments currently queued.
    fn count(&self) -> Result<usize>;

    /// Up to `n` rows, lowest health first (oldest insertion breaks ties).
    fn select_n(&self, n: usize) -> Result<Vec<InjuredSegment>>;

    /// Deletes every row whose scan id is strictly less than `scan_id`,
    /// returning the number of rows removed.
    fn clean(&self, scan_id: u64) -> Result<usize>;

    fn delete(&self, stream_id: StreamId, position: SegmentPosition) -> Result<()>;
}
