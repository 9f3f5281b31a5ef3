//! Segment addressing and piece layout as stored in the metadata catalog.

use crate::node_id::NodeId;
use crate::redundancy::RedundancyScheme;
use crate::stream_id::StreamId;
use std::fmt;
use std::ops::Deref;

/// Identifies a segment within its stream. Persisted as a single `u64`
/// with the part number in the high 32 bits.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SegmentPosition {
    pub part: u32,
    pub index: u32,
}

impl SegmentPosition {
    pub fn new(part: u32, index: u32) -> Self {
        Self { part, index }
    }

    pub fn encode(self) -> u64 {
        (u64::from(self.part) << 32) | u64::from(self.index)
    }

    pub fn decode(encoded: u64) -> Self {
        Self {
            part: (encoded >> 32) as u32,
            index: encoded as u32,
        }
    }
}

impl fmt::Display for SegmentPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.part, self.index)
    }
}

crate::declare_byte_id!(
    /// Derivation root for the per-node piece ids of one segment.
    RootPieceId,
    32
);

/// One encoded share: which erasure index it carries and which node holds it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Piece {
    pub index: u16,
    pub node: NodeId,
}

/// The pieces of a segment, ordered by erasure index.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct Pieces(pub Vec<Piece>);

impl Pieces {
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.0.iter().map(|piece| piece.node).collect()
    }
}

impl Deref for Pieces {
    type Target = Vec<Piece>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Piece> for Pieces {
    fn from_iter<T: IntoIterator<Item = Piece>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A segment row as handed to the repair checker by the ranged-loop driver.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Segment {
    pub stream_id: StreamId,
    pub position: SegmentPosition,
    /// Milliseconds since the epoch.
    pub created_at: u64,
    pub expires_at: Option<u64>,
    pub root_piece_id: RootPieceId,
    pub encrypted_size: u64,
    pub redundancy: RedundancyScheme,
    pub pieces: Pieces,
    pub placement: crate::placement::Placement,
}

impl Segment {
    /// Inline segments keep their data in the catalog row itself; they have
    /// no pieces to lose and the checker skips them.
    pub fn is_inline(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now_ms,
            None => false,
        }
    }
}
