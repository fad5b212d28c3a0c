//! Ordered log of conversation turns
//!
//! Turns are only ever appended. The controlled exceptions are in-place
//! updates of assistant turns (status, text, properties); nothing is removed
//! or reordered.

use super::turn::{Author, PropertyResult, Turn, TurnId, TurnStatus};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("turn {0} already exists")]
    DuplicateTurn(TurnId),
    #[error("turn {0} not found")]
    NotFound(TurnId),
    #[error("turn {0} is not an assistant turn")]
    NotAssistant(TurnId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageStore {
    turns: Vec<Turn>,
    positions: HashMap<TurnId, usize>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `turn` as its first entry
    pub fn starting_with(turn: Turn) -> Self {
        Self {
            positions: HashMap::from([(turn.id, 0)]),
            turns: vec![turn],
        }
    }

    pub fn append(&mut self, turn: Turn) -> Result<(), StoreError> {
        if self.positions.contains_key(&turn.id) {
            return Err(StoreError::DuplicateTurn(turn.id));
        }
        self.positions.insert(turn.id, self.turns.len());
        self.turns.push(turn);
        Ok(())
    }

    pub fn update_status(&mut self, turn_id: TurnId, status: TurnStatus) -> Result<(), StoreError> {
        self.assistant_turn_mut(turn_id)?.status = Some(status);
        Ok(())
    }

    pub fn attach_properties(
        &mut self,
        turn_id: TurnId,
        properties: Vec<PropertyResult>,
    ) -> Result<(), StoreError> {
        self.assistant_turn_mut(turn_id)?.properties = properties;
        Ok(())
    }

    pub fn replace_text(&mut self, turn_id: TurnId, text: impl Into<String>) -> Result<(), StoreError> {
        self.assistant_turn_mut(turn_id)?.text = text.into();
        Ok(())
    }

    /// All turns in creation order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, turn_id: TurnId) -> Option<&Turn> {
        self.positions.get(&turn_id).map(|&pos| &self.turns[pos])
    }

    /// The assistant turn currently awaiting a reply, if any
    pub fn pending_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|turn| turn.is_pending())
    }

    fn assistant_turn_mut(&mut self, turn_id: TurnId) -> Result<&mut Turn, StoreError> {
        let pos = *self
            .positions
            .get(&turn_id)
            .ok_or(StoreError::NotFound(turn_id))?;
        let turn = &mut self.turns[pos];
        if turn.author != Author::Assistant {
            return Err(StoreError::NotAssistant(turn_id));
        }
        Ok(turn)
    }
}
