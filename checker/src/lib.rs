//! The `satellite-checker` library implements the repair checker of the
//! satellite: the service that walks every segment in the metadata catalog,
//! evaluates it against the current storage fleet, ranks unhealthy segments
//! by how close they are to being lost, and keeps the durable repair queue
//! in sync so the repair worker always drains the most urgent work first.

pub mod checker;
pub mod classify;
pub mod config;
pub mod health;
pub mod insert_buffer;
pub mod overlay;
pub mod overrides;
pub mod redundancy;
pub mod reliability_cache;
pub mod result;
pub mod scan;
pub mod stats;

#[macro_use]
extern crate log;

#[macro_use]
extern crate satellite_metrics;

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
