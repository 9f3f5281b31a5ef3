pub use crate::id::ParseIdError;

crate::declare_byte_id!(
    /// Identity of an object stream; all segments of one object share it.
    StreamId,
    16
);
