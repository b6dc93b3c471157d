//! Protocol module containing the peer message payloads and sequence allocation.

pub mod messages;
pub mod sequence;

pub use messages::*;
pub use sequence::SequenceAllocator;
