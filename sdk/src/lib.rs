//! The `satellite-sdk` library holds the domain types shared by the
//! satellite's services: node identities and records, stream/segment
//! addressing, erasure-coding redundancy schemes, and placement rules.

pub mod id;
pub mod node;
pub mod node_id;
pub mod placement;
pub mod redundancy;
pub mod segment;
pub mod stream_id;
pub mod timing;

#[macro_use]
extern crate serde_derive;

pub use bs58;
#[doc(hidden)]
pub use rand;
