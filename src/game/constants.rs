//! Deck composition and default rule constants.

/// Total number of cards in a standard UNO deck.
pub const DECK_SIZE: usize = 108;

/// Copies of each `1`-`9` number card per color (there is only one `0`).
pub const COPIES_PER_NUMBER_CARD: usize = 2;

/// Copies of each action card (skip, reverse, draw 2) per color.
pub const COPIES_PER_ACTION_CARD: usize = 2;

/// Number of plain wild cards in the deck.
pub const WILD_COUNT: usize = 4;

/// Number of wild-draw-4 cards in the deck.
pub const WILD_DRAW4_COUNT: usize = 4;

pub const MIN_PLAYERS: usize = 2;
pub const DEFAULT_MAX_PLAYERS: usize = 10;
pub const DEFAULT_INITIAL_HAND_SIZE: usize = 7;

/// Cards drawn as a penalty for getting caught with one card and no
/// UNO call.
pub const DEFAULT_UNO_PENALTY_DRAWS: usize = 2;

/// Maximum accepted length for a player identifier.
pub const MAX_PLAYER_ID_LENGTH: usize = 32;
