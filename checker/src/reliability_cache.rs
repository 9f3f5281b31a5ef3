//! The `reliability_cache` module materializes the fleet view for a scan:
//! an immutable snapshot of every participating node, swapped wholesale on
//! refresh so readers never observe a half-updated table.

use crate::overlay::FleetSource;
use crate::result::{Error, Result};
use satellite_sdk::node::Node;
use satellite_sdk::node_id::NodeId;
use satellite_sdk::timing::timestamp;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// One published fleet snapshot. Immutable after construction; holders of an
/// earlier `Arc` keep a consistent view while a refresh publishes the next.
pub struct ReliabilityState {
    nodes: HashMap<NodeId, Node>,
    /// Milliseconds since the epoch at which the snapshot was built.
    created_at: u64,
}

impl ReliabilityState {
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The record for `id`, or the zero sentinel record for unknown ids.
    pub fn node(&self, id: &NodeId) -> Node {
        self.nodes.get(id).cloned().unwrap_or_default()
    }

    /// Fills `out` with records in `ids` order. Lengths must match.
    pub fn fill_nodes(&self, ids: &[NodeId], out: &mut [Node]) -> Result<()> {
        if ids.len() != out.len() {
            return Err(Error::InvalidArgument(format!(
                "destination size {} does not match id count {}",
                out.len(),
                ids.len()
            )));
        }
        for (slot, id) in out.iter_mut().zip(ids.iter()) {
            *slot = self.node(id);
        }
        Ok(())
    }
}

pub struct ReliabilityCache {
    overlay: Arc<dyn FleetSource>,
    staleness: Duration,
    online_window: Duration,
    state: RwLock<Option<Arc<ReliabilityState>>>,
    // Serializes refreshes; concurrent refresh requests coalesce here and
    // re-check the published state before hitting the overlay again.
    refresh_lock: Mutex<()>,
}

impl ReliabilityCache {
    pub fn new(
        overlay: Arc<dyn FleetSource>,
        staleness: Duration,
        online_window: Duration,
    ) -> Self {
        Self {
            overlay,
            staleness,
            online_window,
            state: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    fn published(&self) -> Option<Arc<ReliabilityState>> {
        self.state.read().unwrap().clone()
    }

    fn is_current(&self, state: &ReliabilityState, valid_as_of: u64) -> bool {
        state.created_at >= valid_as_of
            && timestamp().saturating_sub(state.created_at) < self.staleness.as_millis() as u64
    }

    /// The snapshot to use for work that started at `valid_as_of`,
    /// refreshing first if the published one predates it or went stale.
    pub fn state_as_of(&self, valid_as_of: u64) -> Result<Arc<ReliabilityState>> {
        if let Some(state) = self.published() {
            if self.is_current(&state, valid_as_of) {
                return Ok(state);
            }
        }
        let _guard = self.refresh_lock.lock().unwrap();
        // Another thread may have refreshed while this one waited.
        if let Some(state) = self.published() {
            if self.is_current(&state, valid_as_of) {
                return Ok(state);
            }
        }
        self.refresh_locked()
    }

    fn refresh_locked(&self) -> Result<Arc<ReliabilityState>> {
        let nodes = self.overlay.participating_nodes(self.online_window)?;
        let state = Arc::new(ReliabilityState {
            created_at: timestamp(),
            nodes: nodes.into_iter().map(|node| (node.id, node)).collect(),
        });
        *self.state.write().unwrap() = Some(state.clone());
        Ok(state)
    }

    /// Count of cached nodes, refreshing if stale.
    pub fn num_nodes(&self) -> Result<usize> {
        self.state_as_of(0).map(|state| state.len())
    }

    /// Count of cached nodes without triggering a refresh; `None` when no
    /// snapshot has been published yet.
    pub fn num_nodes_cached(&self) -> Option<usize> {
        self.published().map(|state| state.len())
    }

    /// Fills `out` with the records for `ids`, in order, from a snapshot no
    /// older than `valid_as_of`. Unknown ids yield the zero record.
    pub fn get_nodes(&self, valid_as_of: u64, ids: &[NodeId], out: &mut [Node]) -> Result<()> {
        if ids.len() != out.len() {
            return Err(Error::InvalidArgument(format!(
                "destination size {} does not match id count {}",
                out.len(),
                ids.len()
            )));
        }
        let state = self.state_as_of(valid_as_of)?;
        state.fill_nodes(ids, out)
    }

    /// Forces a reload. On failure the previously published snapshot, if
    /// any, remains in place.
    pub fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().unwrap();
        self.refresh_locked().map(|_| ())
    }

    /// When the current snapshot was built; `None` before the first refresh.
    pub fn last_update(&self) -> Option<u64> {
        self.published().map(|state| state.created_at)
    }
}
