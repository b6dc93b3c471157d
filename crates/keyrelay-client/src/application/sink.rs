//! The outbound seam between the session and the transport.

use keyrelay_core::OutboundMessage;
use thiserror::Error;

/// Why a message could not be handed to the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The transport's outbound queue is full.
    #[error("outbound queue is full")]
    Full,

    /// The transport task has stopped.
    #[error("transport is closed")]
    Closed,
}

/// Fire-and-forget message emission.
///
/// `Ok` only means the transport accepted the message; it says nothing about
/// whether the peer will receive it.  The pending-delivery ledger exists
/// because of that gap.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink {
    fn emit(&mut self, message: OutboundMessage) -> Result<(), EmitError>;
}
