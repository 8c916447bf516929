//! View domain store: which view the output surface shows, whether content
//! is visible at all, and the UI locale.

use crate::domain::DomainStore;
use crate::protocol::messages::{
    ContentVisibility, Domain, LocaleUpdate, SyncMessage, ViewChange, ViewKind, ViewMessage,
};

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub view: ViewKind,
    /// `false` blanks the output surface without losing the selected view.
    pub content_visible: bool,
    pub locale: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view: ViewKind::default(),
            content_visible: true,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewStore {
    state: ViewState,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }
}

impl DomainStore for ViewStore {
    type Message = ViewMessage;
    const DOMAIN: Domain = Domain::View;

    fn select(message: &SyncMessage) -> Option<&ViewMessage> {
        match message {
            SyncMessage::View(m) => Some(m),
            _ => None,
        }
    }

    fn apply(&mut self, message: &ViewMessage) -> bool {
        match message {
            ViewMessage::Change(c) => self.state.view = c.view,
            ViewMessage::ToggleContent(t) => self.state.content_visible = t.is_visible,
            ViewMessage::Locale(l) => {
                if l.locale.trim().is_empty() {
                    return false;
                }
                self.state.locale = l.locale.clone();
            }
        }
        true
    }

    fn snapshot(&self) -> Vec<SyncMessage> {
        vec![
            SyncMessage::View(ViewMessage::Change(ViewChange {
                view: self.state.view,
            })),
            SyncMessage::View(ViewMessage::ToggleContent(ContentVisibility {
                is_visible: self.state.content_visible,
            })),
            SyncMessage::View(ViewMessage::Locale(LocaleUpdate {
                locale: self.state.locale.clone(),
            })),
        ]
    }
}
