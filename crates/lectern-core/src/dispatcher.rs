//! Message dispatcher: routes every inbound envelope to the one store that
//! owns its domain.
//!
//! # Routing (for beginners)
//!
//! An envelope is decoded once into a [`SyncMessage`].  The domain tag on
//! that value picks the store with an exhaustive `match`, so adding a new
//! domain without a store is a compile error rather than a silent drop.
//!
//! The fixed order in [`DISPATCH_ORDER`] is the documented tie-break and the
//! order in which stores re-broadcast their state during a resync: view first
//! (so the output surface switches to the right screen), then Bible, media
//! and timer.
//!
//! Unknown or malformed envelopes return `false` and change nothing.  Older
//! receivers must keep working when a newer peer sends a type they do not
//! know.

use tokio::sync::watch;

use crate::domain::{BibleStore, DomainStore, MediaStore, TimerStore, ViewStore};
use crate::protocol::codec::decode_message;
use crate::protocol::messages::{Domain, Envelope, SyncMessage};

/// Store priority for dispatch and resync.
pub const DISPATCH_ORDER: [Domain; 4] = [Domain::View, Domain::Bible, Domain::Media, Domain::Timer];

/// Owns one store per domain and routes messages between them.
///
/// Every claimed message bumps a revision counter; UI code holding a
/// [`watch::Receiver`] from [`Dispatcher::subscribe`] is woken after each
/// change and reads the stores through the accessors.
#[derive(Debug)]
pub struct Dispatcher {
    view: ViewStore,
    bible: BibleStore,
    media: MediaStore,
    timer: TimerStore,
    revision: watch::Sender<u64>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(BibleStore::new())
    }
}

impl Dispatcher {
    /// Creates a dispatcher with default stores, except for a pre-seeded
    /// Bible store (the initial font size comes from persisted settings).
    pub fn new(bible: BibleStore) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            view: ViewStore::new(),
            bible,
            media: MediaStore::new(),
            timer: TimerStore::new(),
            revision,
        }
    }

    /// Decodes an envelope and applies it to the owning store.
    ///
    /// Returns `true` if a store claimed it.
    pub fn dispatch(&mut self, envelope: &Envelope) -> bool {
        match decode_message(envelope) {
            Ok(msg) => self.dispatch_message(&msg),
            Err(e) => {
                tracing::debug!("dropping envelope {}: {e}", envelope.message_type);
                false
            }
        }
    }

    /// Applies an already typed message to the owning store.
    pub fn dispatch_message(&mut self, msg: &SyncMessage) -> bool {
        let claimed = match msg {
            SyncMessage::View(m) => self.view.apply(m),
            SyncMessage::Bible(m) => self.bible.apply(m),
            SyncMessage::Media(m) => self.media.apply(m),
            SyncMessage::Timer(m) => self.timer.apply(m),
        };
        if claimed {
            self.revision.send_modify(|r| *r = r.wrapping_add(1));
        } else {
            tracing::debug!(message_type = %msg.message_type(), "message not claimed");
        }
        claimed
    }

    /// Messages that rebuild every store's state, in [`DISPATCH_ORDER`].
    pub fn snapshot(&self) -> Vec<SyncMessage> {
        DISPATCH_ORDER
            .iter()
            .flat_map(|domain| match domain {
                Domain::View => self.view.snapshot(),
                Domain::Bible => self.bible.snapshot(),
                Domain::Media => self.media.snapshot(),
                Domain::Timer => self.timer.snapshot(),
            })
            .collect()
    }

    /// A receiver that changes whenever any store claims a message.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of claimed messages so far.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn view(&self) -> &ViewStore {
        &self.view
    }

    pub fn bible(&self) -> &BibleStore {
        &self.bible
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    pub fn timer(&self) -> &TimerStore {
        &self.timer
    }
}
