//! # lectern-core
//!
//! Shared library for Lectern containing the envelope protocol, the domain
//! stores, the message dispatcher, the drift policy, and the in-process
//! transport channel.
//!
//! This crate is used by both the control surface and the output surface.
//! It has no dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! Lectern drives a projector or second monitor (the **output surface**) from
//! the operator's screen (the **control surface**).  Both surfaces render
//! independently, and the output surface may appear or disappear at any time,
//! so they are kept consistent by exchanging small JSON messages.
//!
//! - **`protocol`** – The closed catalogue of message types, the envelope
//!   shape, the JSON codec that validates payloads, and the few requests the
//!   output surface may send back.
//!
//! - **`domain`** – One store per state domain (view, Bible, media, timer).
//!   Stores change only through their own message handlers.
//!
//! - **`dispatcher`** – Routes each inbound message to the one store that owns
//!   its domain, and collects the resync snapshot.
//!
//! - **`channel`** – The fire-and-forget, FIFO transport contract and an
//!   in-process implementation.
//!
//! - **`drift`** – Thresholds for keeping video playback aligned.
//!
//! - **`scope`** – Scoped release of background resources.

pub mod channel;
pub mod dispatcher;
pub mod domain;
pub mod drift;
pub mod protocol;
pub mod scope;

// Re-export the most-used types at the crate root so callers can write
// `lectern_core::Dispatcher` instead of `lectern_core::dispatcher::Dispatcher`.
pub use channel::{Frame, Inbox, Transport, TransportChannel};
pub use dispatcher::{Dispatcher, DISPATCH_ORDER};
pub use domain::DomainStore;
pub use drift::{DriftCorrection, DriftPolicy};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Domain, Envelope, MessageType, SyncMessage};
pub use protocol::requests::SurfaceRequest;
pub use scope::{ResourceId, ResourceScope};
