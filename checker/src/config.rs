//! Configuration surface of the repair checker.

use crate::overrides::{OverrideKind, RepairOverrides};
use crate::result::{Error, Result};
use satellite_sdk::node::CountryCode;
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_STALENESS_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_ONLINE_WINDOW_MS: u64 = 4 * 60 * 60 * 1000;
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Per-node chance of leaving the fleet on any given day, fit from
/// historical churn.
pub const DEFAULT_NODE_FAILURE_RATE: f64 = 0.00005435;
pub const MAX_SCAN_PARALLELISM: usize = 16;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStrategy {
    #[default]
    Probability,
    Normalized,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CheckerConfig {
    /// Max age of a fleet snapshot before a read triggers a refresh.
    pub staleness_ms: u64,
    /// Max time since last contact for a node to count as online.
    pub online_window_ms: u64,
    /// Forks per scan.
    pub parallelism: usize,
    /// Segments per process call; also the insert-buffer capacity.
    pub batch_size: usize,
    pub do_declumping: bool,
    pub do_placement_check: bool,
    /// `"k-r,..."` or legacy `"k/r/o/t-r,..."`; keyed by required shares.
    pub repair_threshold_overrides: String,
    pub repair_target_overrides: String,
    pub node_failure_rate: f64,
    pub health_strategy: HealthStrategy,
    /// Pieces in these countries force repair even when otherwise healthy.
    pub repair_excluded_country_codes: Vec<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            staleness_ms: DEFAULT_STALENESS_MS,
            online_window_ms: DEFAULT_ONLINE_WINDOW_MS,
            parallelism: num_cpus::get().min(MAX_SCAN_PARALLELISM),
            batch_size: DEFAULT_BATCH_SIZE,
            do_declumping: true,
            do_placement_check: true,
            repair_threshold_overrides: String::new(),
            repair_target_overrides: String::new(),
            node_failure_rate: DEFAULT_NODE_FAILURE_RATE,
            health_strategy: HealthStrategy::default(),
            repair_excluded_country_codes: vec![],
        }
    }
}

impl CheckerConfig {
    pub fn staleness(&self) -> Duration {
        Duration::from_millis(self.staleness_ms)
    }

    pub fn online_window(&self) -> Duration {
        Duration::from_millis(self.online_window_ms)
    }

    pub fn threshold_overrides(&self) -> Result<RepairOverrides> {
        RepairOverrides::parse(&self.repair_threshold_overrides, OverrideKind::RepairThreshold)
    }

    pub fn target_overrides(&self) -> Result<RepairOverrides> {
        RepairOverrides::parse(&self.repair_target_overrides, OverrideKind::RepairTarget)
    }

    pub fn excluded_countries(&self) -> Result<HashSet<CountryCode>> {
        self.repair_excluded_country_codes
            .iter()
            .map(|code| {
                code.parse().map_err(|_| {
                    Error::InvalidConfig(format!("invalid country code {:?}", code))
                })
            })
            .collect()
    }

    /// Fatal-at-startup validation; override strings and country codes are
    /// parsed as a side effect and again by the consumer.
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::InvalidConfig("parallelism must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".to_string()));
        }
        if self.staleness_ms == 0 {
            return Err(Error::InvalidConfig("staleness must be non-zero".to_string()));
        }
        if self.online_window_ms == 0 {
            return Err(Error::InvalidConfig("online window must be non-zero".to_string()));
        }
        if !(self.node_failure_rate > 0.0 && self.node_failure_rate < 1.0) {
            return Err(Error::InvalidConfig(
                "node failure rate must be in (0, 1)".to_string(),
            ));
        }
        self.threshold_overrides()?;
        self.target_overrides()?;
        self.excluded_countries()?;
        Ok(())
    }
}
