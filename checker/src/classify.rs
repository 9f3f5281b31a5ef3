//! Piece classification: given a segment's pieces and the fleet records of
//! the nodes holding them, partition the pieces into disjoint buckets and
//! decide what, if anything, the repair queue should hear about the segment.

use satellite_sdk::node::{CountryCode, Node};
use satellite_sdk::placement::PlacementDefinition;
use satellite_sdk::redundancy::RedundancyScheme;
use satellite_sdk::segment::Piece;
use std::collections::HashSet;

/// Knobs lifted from the checker config; placement annotations can further
/// narrow them per segment.
#[derive(Clone, Debug, Default)]
pub struct ClassifyOptions {
    pub do_declumping: bool,
    pub do_placement_check: bool,
    pub excluded_countries: HashSet<CountryCode>,
}

/// Disjoint partition of a segment's pieces. Every piece lands in exactly
/// one bucket; precedence is missing, offline, out-of-placement, clumped,
/// healthy.
#[derive(Clone, Debug, Default)]
pub struct ClassifiedPieces {
    /// Nodes unknown to the fleet view, disqualified, exited, or suspended.
    pub missing: Vec<Piece>,
    /// Reliable nodes that have not been heard from recently.
    pub offline: Vec<Piece>,
    /// Reliable, online nodes the placement no longer admits (including
    /// nodes in repair-excluded countries).
    pub out_of_placement: Vec<Piece>,
    /// Second and later pieces sharing one network bucket.
    pub clumped: Vec<Piece>,
    pub healthy: Vec<Piece>,
}

impl ClassifiedPieces {
    pub fn num_healthy(&self) -> usize {
        self.healthy.len()
    }

    /// Pieces whose condition mandates repair regardless of redundancy.
    pub fn num_forcing_repair(&self) -> usize {
        self.out_of_placement.len() + self.clumped.len()
    }

    /// Pieces a download attempt could still reach: offline nodes keep
    /// their data and may come back mid-repair.
    pub fn num_retrievable(&self) -> usize {
        self.healthy.len() + self.offline.len()
    }
}

/// Partitions `pieces` against `nodes`, where `nodes[i]` is the fleet record
/// for `pieces[i]` (the zero record for unknown ids).
pub fn classify_pieces(
    pieces: &[Piece],
    nodes: &[Node],
    placement: Option<&PlacementDefinition>,
    options: &ClassifyOptions,
) -> ClassifiedPieces {
    assert_eq!(pieces.len(), nodes.len());
    let mut classified = ClassifiedPieces::default();
    let mut candidates: Vec<(Piece, &str)> = Vec::with_capacity(pieces.len());

    for (piece, node) in pieces.iter().zip(nodes.iter()) {
        if node.is_unknown() || node.disqualified || node.exited || node.suspended {
            classified.missing.push(*piece);
        } else if !node.online {
            classified.offline.push(*piece);
        } else if options.do_placement_check && !placement_admits(node, placement, options) {
            classified.out_of_placement.push(*piece);
        } else {
            candidates.push((*piece, node.network.as_str()));
        }
    }

    let declump = options.do_declumping && !placement.map(|def| def.no_declumping).unwrap_or(false);
    if declump {
        let mut networks_seen: HashSet<&str> = HashSet::with_capacity(candidates.len());
        for (piece, network) in candidates {
            // A node without a known network bucket cannot clump.
            if !network.is_empty() && !networks_seen.insert(network) {
                classified.clumped.push(piece);
            } else {
                classified.healthy.push(piece);
            }
        }
    } else {
        classified.healthy = candidates.into_iter().map(|(piece, _)| piece).collect();
    }

    classified
}

fn placement_admits(
    node: &Node,
    placement: Option<&PlacementDefinition>,
    options: &ClassifyOptions,
) -> bool {
    if options.excluded_countries.contains(&node.country) {
        return false;
    }
    match placement {
        Some(def) => def.filter.matches(node),
        None => true,
    }
}

/// What the scan should do with a segment, given its piece partition and
/// effective redundancy scheme.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SegmentStatus {
    /// Enough redundancy and nothing forcing repair.
    Healthy,
    /// At or below the repair threshold, or carrying forcing pieces.
    NeedsRepair,
    /// Below the reconstruction minimum; queued anyway so the repair worker
    /// can attempt a retrieval with whatever remains.
    Irreparable,
}

pub fn segment_status(
    num_healthy: usize,
    num_forcing_repair: usize,
    scheme: &RedundancyScheme,
) -> SegmentStatus {
    if num_healthy < scheme.required as usize {
        SegmentStatus::Irreparable
    } else if num_healthy <= scheme.repair as usize || num_forcing_repair > 0 {
        SegmentStatus::NeedsRepair
    } else {
        SegmentStatus::Healthy
    }
}
