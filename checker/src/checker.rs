//! The `checker` module implements the ranged-loop observer of the repair
//! checker: one observer owns the shared state of a scan (fleet cache,
//! aggregate stats, queue handle) and hands out forks that process disjoint
//! segment batches in parallel, each with its own insert buffer and stats.
//!
//! Lifecycle per scan: `start -> fork* -> (process)* -> finish* -> end`.

use crate::classify::{classify_pieces, segment_status, ClassifyOptions, SegmentStatus};
use crate::config::{CheckerConfig, HealthStrategy};
use crate::health::SegmentHealth;
use crate::insert_buffer::InsertBuffer;
use crate::overlay::FleetSource;
use crate::overrides::RepairOverrides;
use crate::redundancy::adjust;
use crate::reliability_cache::{ReliabilityCache, ReliabilityState};
use crate::result::{Error, Result};
use crate::stats::ScanStats;
use satellite_queue::{InjuredSegment, QueueError, RepairQueue};
use satellite_sdk::node::Node;
use satellite_sdk::placement::PlacementRules;
use satellite_sdk::segment::Segment;
use satellite_sdk::timing::timestamp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Health score given to segments below their reconstruction minimum, so
/// they sort ahead of everything the fleet can still fully repair.
pub const IRREPARABLE_HEALTH: f64 = 0.0;

struct ScanState {
    scan_id: u64,
    started_at: u64,
    stats: ScanStats,
    queue_write_failed: bool,
}

pub struct Checker {
    cache: Arc<ReliabilityCache>,
    queue: Arc<dyn RepairQueue>,
    health: SegmentHealth,
    placements: PlacementRules,
    threshold_overrides: RepairOverrides,
    target_overrides: RepairOverrides,
    options: ClassifyOptions,
    batch_size: usize,
    scan: Mutex<ScanState>,
}

impl std::fmt::Debug for Checker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checker").finish_non_exhaustive()
    }
}

impl Checker {
    pub fn new(
        config: &CheckerConfig,
        placements: PlacementRules,
        overlay: Arc<dyn FleetSource>,
        queue: Arc<dyn RepairQueue>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(ReliabilityCache::new(
            overlay,
            config.staleness(),
            config.online_window(),
        ));
        let health = match config.health_strategy {
            HealthStrategy::Probability => {
                SegmentHealth::probability(config.node_failure_rate, cache.clone())
            }
            HealthStrategy::Normalized => SegmentHealth::Normalized,
        };
        Ok(Self {
            cache,
            queue,
            health,
            placements,
            threshold_overrides: config.threshold_overrides()?,
            target_overrides: config.target_overrides()?,
            options: ClassifyOptions {
                do_declumping: config.do_declumping,
                do_placement_check: config.do_placement_check,
                excluded_countries: config.excluded_countries()?,
            },
            batch_size: config.batch_size,
            scan: Mutex::new(ScanState {
                scan_id: 0,
                started_at: 0,
                stats: ScanStats::default(),
                queue_write_failed: false,
            }),
        })
    }

    pub fn reliability_cache(&self) -> &Arc<ReliabilityCache> {
        &self.cache
    }

    /// Begins a scan: refreshes the fleet view and resets aggregate stats.
    /// Scan ids must be strictly increasing; reconciliation depends on it.
    pub fn start(&self, scan_id: u64, started_at: u64) -> Result<()> {
        let mut scan = self.scan.lock().unwrap();
        if scan_id <= scan.scan_id {
            return Err(Error::InvalidArgument(format!(
                "scan id {} does not follow {}",
                scan_id, scan.scan_id
            )));
        }
        if let Err(e) = self.cache.refresh() {
            if self.cache.last_update().is_none() {
                return Err(e);
            }
            warn!(
                "fleet refresh failed, scan {} continues on the prior snapshot: {}",
                scan_id, e
            );
        }
        scan.scan_id = scan_id;
        scan.started_at = started_at;
        scan.stats = ScanStats::default();
        scan.queue_write_failed = false;
        Ok(())
    }

    /// A per-worker handle. Forks share nothing mutable; their buffers and
    /// stats fold back in at `finish`.
    pub fn fork(self: &Arc<Self>) -> CheckerFork {
        let (scan_id, valid_as_of) = {
            let scan = self.scan.lock().unwrap();
            (scan.scan_id, scan.started_at)
        };
        CheckerFork {
            checker: self.clone(),
            scan_id,
            valid_as_of,
            buffer: InsertBuffer::new(self.queue.clone(), self.batch_size),
            stats: ScanStats::default(),
        }
    }

    /// Flushes the fork's remaining inserts and merges its stats.
    pub fn finish(&self, mut fork: CheckerFork) {
        let flush_result = fork.buffer.flush();
        if flush_result.is_err() {
            let dropped = fork.buffer.discard();
            fork.stats.queue_insert_failures += dropped as u64;
        }
        let mut scan = self.scan.lock().unwrap();
        if let Err(e) = flush_result {
            warn!("final repair queue flush failed: {}", e);
            scan.queue_write_failed = true;
        }
        scan.stats.merge(&fork.stats);
    }

    /// Ends the scan: publishes stats and reconciles the queue, removing
    /// rows from earlier scans whose segments did not reappear. A scan that
    /// failed any queue write skips reconciliation, since a missed insert
    /// must not look like a recovered segment.
    pub fn end(&self) -> Result<()> {
        let scan = self.scan.lock().unwrap();
        scan.stats.report(scan.scan_id);
        if scan.queue_write_failed {
            warn!(
                "scan {} had failed queue writes, skipping reconciliation",
                scan.scan_id
            );
            return Err(Error::QueueWrite(QueueError::Write(
                "queue writes failed during the scan".to_string(),
            )));
        }
        let removed = self.queue.clean(scan.scan_id)?;
        info!(
            "scan {} removed {} recovered segments from the repair queue",
            scan.scan_id, removed
        );
        datapoint_info!(
            "checker-reconcile",
            ("scan-id", scan.scan_id, i64),
            ("removed", removed, i64),
        );
        Ok(())
    }

    /// Aggregate stats merged so far in the current scan.
    pub fn stats(&self) -> ScanStats {
        self.scan.lock().unwrap().stats.clone()
    }

    fn note_queue_write_failure(&self) {
        self.scan.lock().unwrap().queue_write_failed = true;
    }
}

pub struct CheckerFork {
    checker: Arc<Checker>,
    scan_id: u64,
    valid_as_of: u64,
    buffer: InsertBuffer,
    stats: ScanStats,
}

impl CheckerFork {
    /// Evaluates a batch of segments, upserting the unhealthy ones into the
    /// repair queue. Safe to call concurrently across forks; within a scan a
    /// repeated (stream-id, position) simply overwrites its row.
    ///
    /// Cancellation aborts between segments and discards the buffer, so a
    /// partial scan writes nothing further.
    pub fn process(&mut self, segments: &[Segment], exit: &AtomicBool) -> Result<()> {
        let state = self.checker.cache.state_as_of(self.valid_as_of)?;
        let now = timestamp();
        let mut nodes: Vec<Node> = Vec::new();
        for segment in segments {
            if exit.load(Ordering::Relaxed) {
                self.buffer.discard();
                return Err(Error::Canceled);
            }
            self.process_segment(segment, &state, now, &mut nodes)?;
        }
        Ok(())
    }

    fn process_segment(
        &mut self,
        segment: &Segment,
        state: &ReliabilityState,
        now: u64,
        nodes: &mut Vec<Node>,
    ) -> Result<()> {
        self.stats.segments_checked += 1;
        if segment.is_inline() {
            self.stats.segments_inline += 1;
            return Ok(());
        }
        if segment.is_expired(now) {
            // Not an error and not queued; reconciliation drops any row a
            // previous scan left behind.
            self.stats.segments_expired += 1;
            return Ok(());
        }

        let placement = self.checker.placements.get(segment.placement);
        let scheme = adjust(
            segment.redundancy,
            &self.checker.threshold_overrides,
            &self.checker.target_overrides,
            placement,
        );

        let ids = segment.pieces.node_ids();
        nodes.clear();
        nodes.resize(ids.len(), Node::default());
        state.fill_nodes(&ids, nodes)?;
        let classified = classify_pieces(&segment.pieces, nodes, placement, &self.checker.options);

        let scheme_stats = self.stats.scheme_entry(&segment.redundancy);
        scheme_stats.segments_checked += 1;
        scheme_stats.pieces_missing += classified.missing.len() as u64;
        scheme_stats.pieces_offline += classified.offline.len() as u64;
        scheme_stats.pieces_out_of_placement += classified.out_of_placement.len() as u64;
        scheme_stats.pieces_clumped += classified.clumped.len() as u64;

        match segment_status(
            classified.num_healthy(),
            classified.num_forcing_repair(),
            &scheme,
        ) {
            SegmentStatus::Healthy => {
                self.stats.segments_healthy += 1;
                self.stats.scheme_entry(&segment.redundancy).segments_healthy += 1;
            }
            SegmentStatus::NeedsRepair => {
                let health = self.checker.health.calculate(
                    classified.num_healthy(),
                    scheme.required as usize,
                    classified.num_forcing_repair(),
                );
                trace!(
                    "segment {}/{} needs repair: {} healthy, {} forcing, health {}",
                    segment.stream_id,
                    segment.position,
                    classified.num_healthy(),
                    classified.num_forcing_repair(),
                    health
                );
                self.stats.segments_needing_repair += 1;
                self.stats
                    .scheme_entry(&segment.redundancy)
                    .segments_needing_repair += 1;
                self.enqueue(segment, health, now);
            }
            SegmentStatus::Irreparable => {
                warn!(
                    "segment {}/{} has only {} of {} required pieces, queueing for salvage",
                    segment.stream_id,
                    segment.position,
                    classified.num_healthy(),
                    scheme.required
                );
                self.stats.segments_irreparable += 1;
                self.stats
                    .scheme_entry(&segment.redundancy)
                    .segments_irreparable += 1;
                self.enqueue(segment, IRREPARABLE_HEALTH, now);
            }
        }
        Ok(())
    }

    fn enqueue(&mut self, segment: &Segment, segment_health: f64, now: u64) {
        let row = InjuredSegment {
            stream_id: segment.stream_id,
            position: segment.position,
            placement: segment.placement,
            segment_health,
            inserted_at: now,
            updated_at: now,
            attempt_count: 0,
            scan_id: self.scan_id,
        };
        match self.buffer.insert(row) {
            Ok(()) => self.stats.queue_inserts += 1,
            Err(e) => {
                // No retries inside a scan; count the dropped rows and let
                // `end` surface the failure so reconciliation is skipped.
                let dropped = self.buffer.discard();
                self.stats.queue_insert_failures += dropped as u64;
                warn!(
                    "repair queue insert failed, dropping {} buffered rows: {}",
                    dropped, e
                );
                self.checker.note_queue_write_failure();
            }
        }
    }
}
