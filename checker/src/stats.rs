//! Scan statistics. Each fork accumulates locally and the observer merges at
//! finish, so the hot path never touches shared counters.

use satellite_sdk::redundancy::RedundancyScheme;
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SchemeStats {
    pub segments_checked: u64,
    pub segments_healthy: u64,
    pub segments_needing_repair: u64,
    pub segments_irreparable: u64,
    pub pieces_missing: u64,
    pub pieces_offline: u64,
    pub pieces_out_of_placement: u64,
    pub pieces_clumped: u64,
}

impl SchemeStats {
    fn accumulate(&mut self, other: &SchemeStats) {
        self.segments_checked += other.segments_checked;
        self.segments_healthy += other.segments_healthy;
        self.segments_needing_repair += other.segments_needing_repair;
        self.segments_irreparable += other.segments_irreparable;
        self.pieces_missing += other.pieces_missing;
        self.pieces_offline += other.pieces_offline;
        self.pieces_out_of_placement += other.pieces_out_of_placement;
        self.pieces_clumped += other.pieces_clumped;
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanStats {
    pub segments_checked: u64,
    pub segments_inline: u64,
    pub segments_expired: u64,
    pub segments_healthy: u64,
    pub segments_needing_repair: u64,
    pub segments_irreparable: u64,
    pub queue_inserts: u64,
    pub queue_insert_failures: u64,
    // Keyed by the "required/repair/optimal/total" form of the declared
    // scheme, so operators can tell which redundancy styles are suffering.
    per_scheme: HashMap<String, SchemeStats>,
}

impl ScanStats {
    pub fn scheme_entry(&mut self, scheme: &RedundancyScheme) -> &mut SchemeStats {
        self.per_scheme.entry(scheme.to_string()).or_default()
    }

    pub fn scheme(&self, key: &str) -> Option<&SchemeStats> {
        self.per_scheme.get(key)
    }

    /// Folds a fork's accumulator into this one.
    pub fn merge(&mut self, other: &ScanStats) {
        self.segments_checked += other.segments_checked;
        self.segments_inline += other.segments_inline;
        self.segments_expired += other.segments_expired;
        self.segments_healthy += other.segments_healthy;
        self.segments_needing_repair += other.segments_needing_repair;
        self.segments_irreparable += other.segments_irreparable;
        self.queue_inserts += other.queue_inserts;
        self.queue_insert_failures += other.queue_insert_failures;
        for (key, stats) in &other.per_scheme {
            self.per_scheme
                .entry(key.clone())
                .or_default()
                .accumulate(stats);
        }
    }

    pub fn report(&self, scan_id: u64) {
        datapoint_info!(
            "checker-scan",
            ("scan-id", scan_id, i64),
            ("segments-checked", self.segments_checked, i64),
            ("segments-inline", self.segments_inline, i64),
            ("segments-expired", self.segments_expired, i64),
            ("segments-healthy", self.segments_healthy, i64),
            ("segments-needing-repair", self.segments_needing_repair, i64),
            ("segments-irreparable", self.segments_irreparable, i64),
            ("queue-inserts", self.queue_inserts, i64),
            ("queue-insert-failures", self.queue_insert_failures, i64),
        );
        for (key, stats) in &self.per_scheme {
            datapoint_info!(
                "checker-scan-scheme",
                ("scan-id", scan_id, i64),
                ("scheme", key.as_str(), String),
                ("segments-checked", stats.segments_checked, i64),
                ("segments-healthy", stats.segments_healthy, i64),
                ("segments-needing-repair", stats.segments_needing_repair, i64),
                ("segments-irreparable", stats.segments_irreparable, i64),
                ("pieces-missing", stats.pieces_missing, i64),
                ("pieces-offline", stats.pieces_offline, i64),
                (
                    "pieces-out-of-placement",
                    stats.pieces_out_of_placement,
                    i64
                ),
                ("pieces-clumped", stats.pieces_clumped, i64),
            );
        }
    }
}
