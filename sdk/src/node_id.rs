pub use crate::id::ParseIdError;

crate::declare_byte_id!(
    /// Identity of one storage node, derived from its certificate chain.
    NodeId,
    32
);

impl NodeId {
    /// The all-zero id never identifies a real storage node; it marks the
    /// "unknown node" sentinel record.
    pub fn is_zero(&self) -> bool {
        self.to_bytes() == [0u8; 32]
    }
}
