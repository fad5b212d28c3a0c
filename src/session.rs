//! Conversation session state
//!
//! A [`Session`] is the whole conversation as the user sees it: the turn log,
//! per-turn pagination, and the server-assigned conversation id. It is owned
//! and mutated by the session runtime; everyone else reads snapshots.

mod pagination;
mod store;
mod turn;


pub use pagination::{page_slice, total_pages, PageIndex};
pub use store::{MessageStore, StoreError};
pub use turn::{
    Author, ConversationId, PropertyId, PropertyResult, Turn, TurnId, TurnStatus,
};

use crate::config::PageSize;

/// Shown in place of the reply when an exchange fails
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, I encountered an error. Please try again or rephrase your question.";

/// Transient banner set by a failed exchange
pub const FAILURE_NOTICE: &str = "Failed to get a response. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    conversation_id: Option<ConversationId>,
    store: MessageStore,
    pages: PageIndex,
    notice: Option<&'static str>,
}

impl Session {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            conversation_id: None,
            store: MessageStore::new(),
            pages: PageIndex::new(page_size),
            notice: None,
        }
    }

    /// Session seeded with a synthetic greeting turn
    pub fn with_welcome(page_size: PageSize, text: impl Into<String>) -> Self {
        Self {
            store: MessageStore::starting_with(Turn::welcome(text)),
            ..Self::new(page_size)
        }
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    /// Record the server-assigned id. The first id wins; later calls are
    /// ignored and return false.
    pub fn adopt_conversation_id(&mut self, id: ConversationId) -> bool {
        if self.conversation_id.is_some() {
            return false;
        }
        self.conversation_id = Some(id);
        true
    }

    pub fn turns(&self) -> &[Turn] {
        self.store.turns()
    }

    pub fn turn(&self, turn_id: TurnId) -> Option<&Turn> {
        self.store.get(turn_id)
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    pub fn pages(&self) -> &PageIndex {
        &self.pages
    }

    pub fn has_pending_turn(&self) -> bool {
        self.store.pending_turn().is_some()
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    pub(crate) fn set_notice(&mut self, notice: Option<&'static str>) {
        self.notice = notice;
    }

    /// Properties of `turn_id` visible on its current page
    pub fn visible_properties(&self, turn_id: TurnId) -> &[PropertyResult] {
        match self.store.get(turn_id) {
            Some(turn) => self.pages.visible_slice(&turn.properties, turn_id),
            None => &[],
        }
    }

    pub fn current_page(&self, turn_id: TurnId) -> usize {
        self.pages.current_page(turn_id)
    }

    pub fn total_pages(&self, turn_id: TurnId) -> usize {
        self.pages.total_pages(self.property_count(turn_id))
    }

    pub fn set_page(&mut self, turn_id: TurnId, page: usize) -> bool {
        let total = self.property_count(turn_id);
        self.pages.set_page(turn_id, page, total)
    }

    pub fn next_page(&mut self, turn_id: TurnId) -> bool {
        let total = self.property_count(turn_id);
        self.pages.next_page(turn_id, total)
    }

    pub fn previous_page(&mut self, turn_id: TurnId) -> bool {
        let total = self.property_count(turn_id);
        self.pages.previous_page(turn_id, total)
    }

    /// Most recent turn carrying properties
    pub fn latest_turn_with_properties(&self) -> Option<&Turn> {
        self.turns().iter().rev().find(|turn| !turn.properties.is_empty())
    }

    fn property_count(&self, turn_id: TurnId) -> usize {
        self.store.get(turn_id).map_or(0, |turn| turn.properties.len())
    }
}
