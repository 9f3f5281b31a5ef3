//! In-process scan driver: partitions a segment listing into batches, feeds
//! a configured number of forks over a channel, and drives the observer
//! lifecycle to completion. Production deployments run the checker under
//! the satellite's ranged-loop driver instead; this one backs integration
//! tests and single-node tooling.

use crate::checker::Checker;
use crate::result::{Error, Result};
use satellite_sdk::segment::Segment;
use satellite_sdk::timing::timestamp;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::Builder;
use std::time::Instant;

/// Runs one full scan with `parallelism` forks over `batch_size`-segment
/// batches. Returns the observer's end-of-scan result; if any fork fails,
/// the scan counts as partial and reconciliation is not attempted.
pub fn run_scan(
    checker: &Arc<Checker>,
    scan_id: u64,
    segments: &[Segment],
    parallelism: usize,
    batch_size: usize,
    exit: &Arc<AtomicBool>,
) -> Result<()> {
    let scan_start = Instant::now();
    checker.start(scan_id, timestamp())?;

    let (batch_sender, batch_receiver) = crossbeam_channel::unbounded::<Vec<Segment>>();
    for batch in segments.chunks(batch_size.max(1)) {
        batch_sender
            .send(batch.to_vec())
            .expect("scan batch channel closed before send");
    }
    drop(batch_sender);

    let handles: Vec<_> = (0..parallelism.max(1))
        .map(|index| {
            let checker = checker.clone();
            let batch_receiver = batch_receiver.clone();
            let exit = exit.clone();
            Builder::new()
                .name(format!("satellite-scan-{}", index))
                .spawn(move || -> Result<()> {
                    let mut fork = checker.fork();
                    while let Ok(batch) = batch_receiver.recv() {
                        fork.process(&batch, &exit)?;
                    }
                    checker.finish(fork);
                    Ok(())
                })
                .unwrap()
        })
        .collect();

    let mut fork_result = Ok(());
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => fork_result = Err(e),
            Err(_) => fork_result = Err(Error::Canceled),
        }
    }
    // Only a completed scan may reconcile the queue.
    fork_result?;

    let result = checker.end();
    debug!(
        "scan {} over {} segments took {}ms",
        scan_id,
        segments.len(),
        scan_start.elapsed().as_millis()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckerConfig;
    use crate::overlay::StaticFleet;
    use satellite_queue::memory::MemoryRepairQueue;
    use satellite_sdk::placement::PlacementRules;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_empty_scan_completes() {
        let checker = Arc::new(
            Checker::new(
                &CheckerConfig::default(),
                PlacementRules::default(),
                Arc::new(StaticFleet::new()),
                Arc::new(MemoryRepairQueue::new()),
            )
            .unwrap(),
        );
        let exit = Arc::new(AtomicBool::new(false));
        run_scan(&checker, 1, &[], 4, 10, &exit).unwrap();
        assert_eq!(checker.stats().segments_checked, 0);
    }

    #[test]
    fn test_canceled_scan_does_not_reconcile() {
        let queue = Arc::new(MemoryRepairQueue::new());
        let checker = Arc::new(
            Checker::new(
                &CheckerConfig::default(),
                PlacementRules::default(),
                Arc::new(StaticFleet::new()),
                queue.clone(),
            )
            .unwrap(),
        );
        let exit = Arc::new(AtomicBool::new(true));
        let segments = vec![Segment::default()];
        assert_matches!(
            run_scan(&checker, 1, &segments, 1, 1, &exit),
            Err(Error::Canceled)
        );
        exit.store(false, Ordering::Relaxed);
        run_scan(&checker, 2, &segments, 1, 1, &exit).unwrap();
    }
}
