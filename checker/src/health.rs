//! Health scoring for repair prioritization: a single scalar per segment,
//! lower meaning "repair sooner". The repair worker drains the queue in
//! ascending health order, so the ordering between scores is what matters.

use crate::reliability_cache::ReliabilityCache;
use std::sync::Arc;

/// Fleet size assumed when the reliability cache has no snapshot yet.
pub const DEFAULT_FLEET_SIZE: usize = 10_000;

/// Lower bound on assumed whole-fleet churn per day; keeps scores finite and
/// comparable when the configured failure rate is extreme or the fleet tiny.
pub const MIN_CHURN_PER_DAY: f64 = 1e-3;

/// Scores below this mark a segment that can no longer lose pieces safely;
/// scores of repairable-but-unhealthy segments start at this floor.
pub const REPAIRABLE_HEALTH_FLOOR: f64 = 1.0;

#[derive(Clone)]
pub enum SegmentHealth {
    /// Expected days until the segment drops below `min` healthy pieces,
    /// assuming the fleet loses `failure_rate * fleet_size` uniformly random
    /// nodes per day.
    Probability {
        failure_rate: f64,
        fleet: Arc<ReliabilityCache>,
    },
    /// Dimensionless surplus of healthy pieces over the minimum.
    Normalized,
}

impl SegmentHealth {
    pub fn probability(failure_rate: f64, fleet: Arc<ReliabilityCache>) -> Self {
        SegmentHealth::Probability {
            failure_rate,
            fleet,
        }
    }

    /// Scores a segment with `healthy` reliable pieces of `min` required,
    /// `forcing` of which sit in a state that mandates repair regardless of
    /// redundancy (clumped, misplaced, excluded country).
    pub fn calculate(&self, healthy: usize, min: usize, forcing: usize) -> f64 {
        match self {
            SegmentHealth::Probability {
                failure_rate,
                fleet,
            } => probability_health(healthy, min, forcing, *failure_rate, fleet),
            SegmentHealth::Normalized => normalized_health(healthy, min, forcing),
        }
    }
}

fn probability_health(
    healthy: usize,
    min: usize,
    forcing: usize,
    failure_rate: f64,
    fleet: &ReliabilityCache,
) -> f64 {
    if healthy <= min {
        // Already at or below the reconstruction minimum: everything here
        // outranks every repairable segment, ordered by how many pieces
        // remain.
        return healthy as f64 / (min as f64 + 1.0);
    }

    let fleet_size = match fleet.num_nodes_cached() {
        Some(count) => count.max(1),
        None => {
            warn!(
                "reliability cache is empty, assuming fleet of {} for segment health",
                DEFAULT_FLEET_SIZE
            );
            DEFAULT_FLEET_SIZE
        }
    };
    let fleet_size = fleet_size.max(healthy) as f64;
    let churn_per_day = (fleet_size * failure_rate).max(MIN_CHURN_PER_DAY);

    // One uniformly random node fails per round; losing a piece while j
    // pieces remain takes fleet/j rounds in expectation. Summing from
    // `healthy` down to `min` counts the rounds until the segment becomes
    // unreconstructable.
    let mut rounds = 0.0;
    for j in min..=healthy {
        rounds += fleet_size / j as f64;
    }
    let days = rounds / churn_per_day;

    REPAIRABLE_HEALTH_FLOOR + days / (1.0 + forcing as f64)
}

fn normalized_health(healthy: usize, min: usize, forcing: usize) -> f64 {
    let min_f = min as f64;
    let base = (healthy as f64 - min_f + 1.0) / min_f;
    if forcing == 0 {
        return base;
    }
    // Forced repairs rank between mild under-replication and critical
    // segments: the more forcing pieces, the closer to 0.2.
    let significance = (forcing as f64 / min_f).min(1.0);
    base.min(0.4 - 0.2 * significance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::StaticFleet;
    use satellite_sdk::node::Node;
    use satellite_sdk::node_id::NodeId;
    use std::time::Duration;

    fn cache_with_nodes(count: usize) -> Arc<ReliabilityCache> {
        let fleet = Arc::new(StaticFleet::new());
        for _ in 0..count {
            fleet.put(Node {
                id: NodeId::new_rand(),
                online: true,
                ..Node::default()
            });
        }
        let cache = Arc::new(ReliabilityCache::new(
            fleet,
            Duration::from_secs(300),
            Duration::from_secs(4 * 3600),
        ));
        cache.refresh().unwrap();
        cache
    }

    fn probability() -> SegmentHealth {
        SegmentHealth::probability(0.00005435, cache_with_nodes(100))
    }

    #[test]
    fn test_extra_piece_lowers_priority() {
        for health in [probability(), SegmentHealth::Normalized] {
            for healthy in 11..60 {
                assert!(
                    health.calculate(healthy + 1, 10, 0) > health.calculate(healthy, 10, 0),
                    "healthy={}",
                    healthy
                );
            }
        }
    }

    #[test]
    fn test_higher_min_is_more_urgent() {
        for health in [probability(), SegmentHealth::Normalized] {
            assert!(health.calculate(20, 10, 0) > health.calculate(20, 15, 0));
        }
    }

    #[test]
    fn test_forcing_piece_raises_priority() {
        for health in [probability(), SegmentHealth::Normalized] {
            for forcing in 0..5 {
                assert!(
                    health.calculate(20, 10, forcing + 1) <= health.calculate(20, 10, forcing)
                );
            }
        }
    }

    #[test]
    fn test_critical_outranks_any_forced_segment() {
        for health in [probability(), SegmentHealth::Normalized] {
            let critical = health.calculate(7, 10, 0);
            for forcing in 1..30 {
                assert!(critical < health.calculate(30, 10, forcing));
            }
        }
    }

    #[test]
    fn test_repairable_outranked_by_at_or_below_min() {
        for health in [probability(), SegmentHealth::Normalized] {
            let mildly_injured = health.calculate(11, 10, 0);
            for healthy in 0..=10 {
                assert!(
                    health.calculate(healthy, 10, 0) < mildly_injured,
                    "healthy={}",
                    healthy
                );
            }
        }
        // The probability scale is absolute: the repairable floor holds
        // across differing minimums as well.
        let health = probability();
        let mildly_injured = health.calculate(11, 10, 0);
        for (healthy, min) in [(2usize, 2usize), (999, 1000), (50, 50)] {
            assert!(health.calculate(healthy, min, 0) < mildly_injured);
        }
    }

    #[test]
    fn test_normalized_forced_band() {
        let health = SegmentHealth::Normalized;
        // Well-replicated but forced: clamped into [0.2, 0.4).
        for forcing in 1..=10 {
            let score = health.calculate(30, 10, forcing);
            assert!((0.2..0.4).contains(&score), "forcing={}", forcing);
        }
        // Saturated significance pins the band floor.
        assert_eq!(health.calculate(30, 10, 10), 0.2);
        // Mildly injured and forced: the base already wins.
        assert!(health.calculate(11, 10, 1) <= 0.2);
    }

    #[test]
    fn test_probability_empty_cache_uses_default_fleet() {
        let fleet = Arc::new(StaticFleet::new());
        let cache = Arc::new(ReliabilityCache::new(
            fleet,
            Duration::from_secs(300),
            Duration::from_secs(4 * 3600),
        ));
        // No refresh: no snapshot published.
        let health = SegmentHealth::probability(0.00005435, cache);
        let score = health.calculate(20, 10, 0);
        assert!(score.is_finite());
        assert!(score > REPAIRABLE_HEALTH_FLOOR);
    }

    #[test]
    fn test_probability_zero_fleet_clamps_to_one() {
        let health = SegmentHealth::probability(0.00005435, cache_with_nodes(0));
        let score = health.calculate(20, 10, 0);
        assert!(score.is_finite());
        assert!(score > REPAIRABLE_HEALTH_FLOOR);
    }
}
