//! Core UNO game logic: entities, deck management, and the turn-based
//! state machine.

pub mod constants;
pub mod entities;
pub mod state_machine;

pub use entities::{
    Card, CardColor, CardId, CardKind, CardValue, Deck, DiscardPile, Player, PlayerId, TurnState,
};
pub use state_machine::{ActionError, GameEvent, Transition, UnoConfig, UnoState};
