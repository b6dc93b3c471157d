//! Application layer for keyrelay-client.
//!
//! - [`session`]: the delivery session.  Owns the pressed-key set, the
//!   pending-delivery ledger, the connection tracker and the status surface,
//!   and reacts to input commands, link signals and deadlines.
//! - [`sink`]: the outbound seam.  The session never touches a socket; it
//!   hands messages to an [`EventSink`].

pub mod session;
pub mod sink;

pub use session::{ClientInfo, Session, SessionError, SessionSettings, StatusSnapshot};
pub use sink::{EmitError, EventSink};
