//! The `satellite-metrics` library publishes structured datapoints through
//! the log stream, where the deployment's telemetry shipper picks them up.

pub mod datapoint;

pub use log;

use crate::datapoint::DataPoint;

/// Writes one datapoint to the `metrics` log target at the given level.
pub fn submit(point: DataPoint, level: log::Level) {
    log::log!(target: "metrics", level, "datapoint: {}", point);
}
