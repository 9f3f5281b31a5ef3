//! Fleet-view collaborator: the overlay hands the checker every node that
//! could still hold repair-relevant pieces, with current reliability flags.

use satellite_sdk::node::Node;
use satellite_sdk::node_id::NodeId;
use satellite_sdk::timing::timestamp;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("overlay unavailable: {0}")]
    Unavailable(String),

    #[error("overlay lookup canceled")]
    Canceled,
}

pub trait FleetSource: Send + Sync {
    /// Every node participating in repair, including disqualified, suspended,
    /// and exited nodes (the checker needs their flags to classify pieces).
    /// `online` must reflect whether the node was heard from within
    /// `online_window`.
    fn participating_nodes(&self, online_window: Duration) -> Result<Vec<Node>, OverlayError>;
}

/// In-process fleet used by tests and single-node tooling. Nodes are stored
/// as-is; only the `online` flag is recomputed from `last_contact` on read.
#[derive(Default)]
pub struct StaticFleet {
    nodes: RwLock<HashMap<NodeId, Node>>,
    // Test hook: makes lookups fail until cleared.
    fail_lookups: AtomicBool,
}

impl StaticFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, node: Node) {
        self.nodes.write().unwrap().insert(node.id, node);
    }

    pub fn remove(&self, id: &NodeId) {
        self.nodes.write().unwrap().remove(id);
    }

    pub fn update<F>(&self, id: &NodeId, mutate: F)
    where
        F: FnOnce(&mut Node),
    {
        if let Some(node) = self.nodes.write().unwrap().get_mut(id) {
            mutate(node);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::Relaxed);
    }
}

impl FleetSource for StaticFleet {
    fn participating_nodes(&self, online_window: Duration) -> Result<Vec<Node>, OverlayError> {
        if self.fail_lookups.load(Ordering::Relaxed) {
            return Err(OverlayError::Unavailable("injected failure".to_string()));
        }
        let now = timestamp();
        let window_ms = online_window.as_millis() as u64;
        let nodes = self
            .nodes
            .read()
            .unwrap()
            .values()
            .map(|node| {
                let heard_recently =
                    node.last_contact == 0 || now.saturating_sub(node.last_contact) <= window_ms;
                Node {
                    online: node.online && heard_recently,
                    ..node.clone()
                }
            })
            .collect();
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet_node(last_contact: u64) -> Node {
        Node {
            id: NodeId::new_rand(),
            online: true,
            last_contact,
            network: "198.51.100.0".to_string(),
            ..Node::default()
        }
    }

    #[test]
    fn test_online_window() {
        let fleet = StaticFleet::new();
        let fresh = fleet_node(timestamp());
        let stale = fleet_node(1);
        fleet.put(fresh.clone());
        fleet.put(stale.clone());

        let nodes = fleet
            .participating_nodes(Duration::from_secs(3600))
            .unwrap();
        let by_id: HashMap<_, _> = nodes.into_iter().map(|n| (n.id, n)).collect();
        assert!(by_id[&fresh.id].online);
        assert!(!by_id[&stale.id].online);
    }

    #[test]
    fn test_flags_pass_through() {
        let fleet = StaticFleet::new();
        let node = fleet_node(timestamp());
        fleet.put(node.clone());
        fleet.update(&node.id, |n| n.disqualified = true);

        let nodes = fleet
            .participating_nodes(Duration::from_secs(3600))
            .unwrap();
        assert!(nodes[0].disqualified);
        assert!(nodes[0].online);
    }

    #[test]
    fn test_injected_failure() {
        let fleet = StaticFleet::new();
        fleet.set_fail_lookups(true);
        assert!(fleet
            .participating_nodes(Duration::from_secs(1))
            .is_err());
        fleet.set_fail_lookups(false);
        assert!(fleet.participating_nodes(Duration::from_secs(1)).is_ok());
    }
}
