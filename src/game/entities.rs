use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Red,
    Blue,
    Green,
    Yellow,
    // Wild is the color of the colorless cards; `current_color`
    // is never allowed to take this value.
    Wild,
}

impl CardColor {
    /// The four playable colors, in deck-building order.
    pub const STANDARD: [Self; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Wild => "wild",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Number,
    Skip,
    Reverse,
    Draw2,
    Wild,
    WildDraw4,
}

impl CardKind {
    #[must_use]
    pub const fn is_wild(self) -> bool {
        matches!(self, Self::Wild | Self::WildDraw4)
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Number => "number",
            Self::Skip => "skip",
            Self::Reverse => "reverse",
            Self::Draw2 => "draw 2",
            Self::Wild => "wild",
            Self::WildDraw4 => "wild draw 4",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for number card values (0-9).
pub type CardValue = u8;

/// Unique identifier for one card instance. Cards are value-like;
/// the id only matters for locating a specific instance in a hand
/// or pile.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CardId(Uuid);

impl CardId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single immutable card. `value` is present only for `Number` cards.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub color: CardColor,
    pub kind: CardKind,
    pub value: Option<CardValue>,
}

impl Card {
    #[must_use]
    pub fn number(color: CardColor, value: CardValue) -> Self {
        Self {
            id: CardId::new(),
            color,
            kind: CardKind::Number,
            value: Some(value),
        }
    }

    #[must_use]
    pub fn action(color: CardColor, kind: CardKind) -> Self {
        Self {
            id: CardId::new(),
            color,
            kind,
            value: None,
        }
    }

    #[must_use]
    pub fn wild(kind: CardKind) -> Self {
        Self {
            id: CardId::new(),
            color: CardColor::Wild,
            kind,
            value: None,
        }
    }

    #[must_use]
    pub const fn is_wild(&self) -> bool {
        self.kind.is_wild()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.kind, self.value) {
            (CardKind::Number, Some(value)) => write!(f, "{} {value}", self.color),
            (CardKind::Wild | CardKind::WildDraw4, _) => write!(f, "{}", self.kind),
            _ => write!(f, "{} {}", self.color, self.kind),
        }
    }
}

/// Identifier the room layer uses for a player. Whitespace is
/// collapsed to underscores and overly long identifiers are truncated.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        let id: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(constants::MAX_PLAYER_ID_LENGTH)
            .collect();
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub connected: bool,
    pub score: u32,
    /// Self-declaration of holding one card. Cleared whenever the
    /// hand grows past one card again.
    pub uno_called: bool,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::with_capacity(constants::DEFAULT_INITIAL_HAND_SIZE),
            connected: true,
            score: 0,
            uno_called: false,
        }
    }

    #[must_use]
    pub fn holds(&self, card_id: CardId) -> bool {
        self.hand.iter().any(|c| c.id == card_id)
    }
}

/// The draw supply. Cards are drawn from the top (the end of the
/// backing vector).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Build the full 108-card supply, uniformly shuffled: per color
    /// one `0`, two each of `1`-`9`, two skips, two reverses, two
    /// draw 2s, plus four wilds and four wild draw 4s.
    #[must_use]
    pub fn standard<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = Vec::with_capacity(constants::DECK_SIZE);
        for color in CardColor::STANDARD {
            cards.push(Card::number(color, 0));
            for value in 1..=9 {
                for _ in 0..constants::COPIES_PER_NUMBER_CARD {
                    cards.push(Card::number(color, value));
                }
            }
            for kind in [CardKind::Skip, CardKind::Reverse, CardKind::Draw2] {
                for _ in 0..constants::COPIES_PER_ACTION_CARD {
                    cards.push(Card::action(color, kind));
                }
            }
        }
        for _ in 0..constants::WILD_COUNT {
            cards.push(Card::wild(CardKind::Wild));
        }
        for _ in 0..constants::WILD_DRAW4_COUNT {
            cards.push(Card::wild(CardKind::WildDraw4));
        }
        let mut deck = Self { cards };
        deck.shuffle(rng);
        deck
    }

    pub(crate) fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Take the top card, or `None` when the supply is exhausted.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Put a card back into the supply. The deck should be reshuffled
    /// afterwards; this alone does not randomize the card's position.
    pub fn return_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Recycle the discard pile into the deck: everything but the
    /// pile's top card is shuffled in. A pile holding at most one card
    /// has nothing to recycle and this is a no-op. Returns the number
    /// of cards recycled.
    pub fn replenish_from<R: Rng + ?Sized>(
        &mut self,
        pile: &mut DiscardPile,
        rng: &mut R,
    ) -> usize {
        let recycled = pile.take_all_but_top();
        let count = recycled.len();
        if count > 0 {
            self.cards.extend(recycled);
            self.shuffle(rng);
        }
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

/// Ordered history of played cards. The top card is the current
/// target for legality matching; top and count are derived from the
/// backing storage so they can never drift out of sync.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiscardPile {
    cards: Vec<Card>,
}

impl DiscardPile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[must_use]
    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Drain everything below the top card, leaving the top as the
    /// sole entry. Empty and single-card piles are left untouched.
    fn take_all_but_top(&mut self) -> Vec<Card> {
        if self.cards.len() <= 1 {
            return Vec::new();
        }
        let top_idx = self.cards.len() - 1;
        self.cards.drain(..top_idx).collect()
    }
}

/// Per-turn state of the current player.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "card_id")]
pub enum TurnState {
    /// Normal play: the current player may play any legal hand card
    /// or draw.
    Playing,
    /// The current player drew a playable card and must now either
    /// play that exact card or pass.
    AwaitingDrawnCard(CardId),
}
