//! Domain stores for Lectern.
//!
//! Each store owns exactly one slice of synchronized state (view, Bible,
//! media, timer) and changes only through its own message handler.
//!
//! # What is a domain store? (for beginners)
//!
//! Both surfaces hold an identical set of stores.  When the operator selects
//! a verse on the control surface, the control-side Bible store applies the
//! change and the same message is sent to the output surface, whose Bible
//! store applies it too.  Because both sides run the same pure handler on
//! the same message, their state stays equal without any shared memory.
//!
//! A handler either **claims** a message (the message belongs to the store's
//! domain, the payload is valid, and the state has been updated) or returns
//! `false` and leaves the state exactly as it was.  Updates are computed in
//! full before they are assigned, so no reader ever sees half a change.

use crate::protocol::codec::decode_message;
use crate::protocol::messages::{Domain, Envelope, SyncMessage};

pub mod bible;
pub mod books;
pub mod media;
pub mod timer;
pub mod view;

pub use bible::{BibleState, BibleStore, ContentBuffer, DEFAULT_FONT_SIZE};
pub use media::{MediaSource, MediaState, MediaStore, Pan, PlaybackState};
pub use timer::{TimerStateSnapshot, TimerStore};
pub use view::{ViewState, ViewStore};

/// Common behaviour of the four domain stores.
pub trait DomainStore {
    /// The typed messages of this store's domain.
    type Message;

    /// The domain this store owns.
    const DOMAIN: Domain;

    /// Extracts this domain's message from the tagged union, if it is one.
    fn select(message: &SyncMessage) -> Option<&Self::Message>;

    /// Applies a typed message.  Returns `true` if claimed.
    fn apply(&mut self, message: &Self::Message) -> bool;

    /// Messages that rebuild this store's current state on an empty peer.
    fn snapshot(&self) -> Vec<SyncMessage>;

    /// Offers a raw envelope to this store.
    ///
    /// Claims it only if the type belongs to this domain and the payload
    /// decodes cleanly; otherwise returns `false` without touching state.
    fn handle_message(&mut self, envelope: &Envelope) -> bool {
        match envelope.kind() {
            Some(kind) if kind.domain() == Self::DOMAIN => {}
            _ => return false,
        }
        match decode_message(envelope) {
            Ok(message) => match Self::select(&message) {
                Some(m) => self.apply(m),
                None => false,
            },
            Err(e) => {
                tracing::debug!(domain = ?Self::DOMAIN, "ignoring envelope: {e}");
                false
            }
        }
    }
}
