//! UNO game state machine implementation.
//!
//! This module owns the authoritative game state and every transition
//! operation: playing, drawing, passing, UNO calls and penalties, turn
//! advancement, and winner detection. The surrounding room layer feeds
//! player actions in and broadcasts the resulting state; the engine
//! itself performs no I/O.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;
use uuid::Uuid;

use super::constants::{
    DEFAULT_INITIAL_HAND_SIZE, DEFAULT_MAX_PLAYERS, DEFAULT_UNO_PENALTY_DRAWS, MIN_PLAYERS,
};
use super::entities::{
    Card, CardColor, CardId, CardKind, Deck, DiscardPile, Player, PlayerId, TurnState,
};

/// Reasons an action is declined. Every declined action is a no-op on
/// state; the engine never aborts on caller input.
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ActionError {
    #[error("player not found")]
    PlayerNotFound,
    #[error("not your turn")]
    NotYourTurn,
    #[error("card not in hand")]
    CardNotInHand,
    #[error("illegal move")]
    IllegalMove,
    #[error("must choose color")]
    MustChooseColor,
    #[error("already drawn a card")]
    AlreadyDrawn,
    #[error("cannot pass without drawing")]
    CannotPassWithoutDrawing,
    #[error("too many cards to call UNO")]
    TooManyCardsToCallUno,
    #[error("player is safe")]
    PlayerIsSafe,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("game is full")]
    CapacityReached,
    #[error("hand is already over")]
    HandFinished,
    #[error("not enough cards to start a hand")]
    InsufficientCards,
}

/// Events that occur during gameplay, drained by the caller for
/// activity feeds and richer broadcasts.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    CardPlayed(PlayerId, Card),
    CardsDrawn(PlayerId, usize),
    TurnSkipped(PlayerId),
    DirectionReversed,
    DeckReplenished(usize),
    UnoCalled(PlayerId),
    UnoPenalty(PlayerId, usize),
    PlayerFinished(PlayerId),
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::CardPlayed(id, card) => format!("{id} plays {card}"),
            Self::CardsDrawn(id, 1) => format!("{id} draws a card"),
            Self::CardsDrawn(id, count) => format!("{id} draws {count} cards"),
            Self::TurnSkipped(id) => format!("{id}'s turn is skipped"),
            Self::DirectionReversed => "play direction is reversed".to_string(),
            Self::DeckReplenished(count) => {
                format!("{count} discarded cards shuffled back into the deck")
            }
            Self::UnoCalled(id) => format!("{id} calls UNO"),
            Self::UnoPenalty(id, count) => {
                format!("{id} caught without calling UNO and draws {count} cards")
            }
            Self::PlayerFinished(id) => format!("{id} has no cards left"),
        };
        write!(f, "{repr}")
    }
}

/// Ruleset for one game, immutable after the deal.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct UnoConfig {
    pub initial_hand_size: usize,
    /// When set, wild draw 4 is only playable if the player's hand has
    /// no card matching the current color.
    pub enforce_wild_draw4_restriction: bool,
    pub max_players: usize,
    /// Cards drawn on a caught UNO failure.
    pub uno_penalty_draws: usize,
}

impl Default for UnoConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_INITIAL_HAND_SIZE,
            true,
            DEFAULT_MAX_PLAYERS,
            DEFAULT_UNO_PENALTY_DRAWS,
        )
    }
}

impl UnoConfig {
    #[must_use]
    pub const fn new(
        initial_hand_size: usize,
        enforce_wild_draw4_restriction: bool,
        max_players: usize,
        uno_penalty_draws: usize,
    ) -> Self {
        Self {
            initial_hand_size,
            enforce_wild_draw4_restriction,
            max_players,
            uno_penalty_draws,
        }
    }
}

/// What the caller should do after a successful action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    NextTurn,
    GameOver,
}

/// Authoritative state of one UNO hand.
///
/// Each operation validates fully before mutating, so a declined
/// action leaves the state untouched. Serialization covers everything
/// the room layer needs to snapshot and broadcast; the pending event
/// queue is drained separately via [`UnoState::drain_events`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct UnoState {
    pub id: Uuid,
    /// Fixed player order established at game creation. Only hand
    /// contents change during play.
    pub players: Vec<Player>,
    deck: Deck,
    discard: DiscardPile,
    /// The color new plays must match. Never `CardColor::Wild`.
    pub current_color: CardColor,
    pub turn_index: usize,
    /// +1 or -1, flipped by reverse cards.
    pub direction: i32,
    pub turn_state: TurnState,
    /// Players in the order they emptied their hand.
    pub winner_order: Vec<PlayerId>,
    pub config: UnoConfig,
    /// Timestamp of the last successful mutation; the room layer uses
    /// this for idle-game expiry.
    pub last_action_at: DateTime<Utc>,
    #[serde(skip)]
    events: VecDeque<GameEvent>,
}

impl UnoState {
    /// Start a new hand: build and shuffle the deck, deal opening
    /// hands round-robin, reveal the starting discard, and apply its
    /// effect as if it had been played before the first turn.
    pub fn new(identities: &[(PlayerId, String)], config: UnoConfig) -> Result<Self, ActionError> {
        Self::new_with_rng(identities, config, &mut rand::rng())
    }

    /// [`UnoState::new`] with an injectable randomness source.
    pub fn new_with_rng<R: Rng + ?Sized>(
        identities: &[(PlayerId, String)],
        config: UnoConfig,
        rng: &mut R,
    ) -> Result<Self, ActionError> {
        if identities.len() < MIN_PLAYERS {
            return Err(ActionError::NotEnoughPlayers);
        }
        if identities.len() > config.max_players {
            return Err(ActionError::CapacityReached);
        }

        let mut deck = Deck::standard(rng);
        let mut players: Vec<Player> = identities
            .iter()
            .map(|(id, name)| Player::new(id.clone(), name.clone()))
            .collect();

        // Deal round-robin in player order; an exhausted deck mid-deal
        // silently shorts the remaining hands.
        for _ in 0..config.initial_hand_size {
            for player in &mut players {
                let Some(card) = deck.draw() else { break };
                player.hand.push(card);
            }
        }

        // Reveal the starting discard. A wild draw 4 can never start
        // the hand: set it aside, keep drawing, then shuffle the
        // set-aside cards back in.
        let mut set_aside = Vec::new();
        let start = loop {
            match deck.draw() {
                Some(card) if card.kind == CardKind::WildDraw4 => set_aside.push(card),
                Some(card) => break card,
                None => return Err(ActionError::InsufficientCards),
            }
        };
        if !set_aside.is_empty() {
            for card in set_aside {
                deck.return_card(card);
            }
            deck.shuffle(rng);
        }

        let current_color = match start.color {
            CardColor::Wild => CardColor::Red,
            color => color,
        };
        let mut discard = DiscardPile::new();
        discard.push(start);

        let mut state = Self {
            id: Uuid::new_v4(),
            players,
            deck,
            discard,
            current_color,
            turn_index: 0,
            direction: 1,
            turn_state: TurnState::Playing,
            winner_order: Vec::new(),
            config,
            last_action_at: Utc::now(),
            events: VecDeque::new(),
        };

        match start.kind {
            CardKind::Draw2 => {
                let drawn = state.force_draw(0, 2, rng);
                if drawn > 0 {
                    state
                        .events
                        .push_back(GameEvent::CardsDrawn(state.players[0].id.clone(), drawn));
                }
                state.advance_turn();
            }
            CardKind::Skip => {
                state
                    .events
                    .push_back(GameEvent::TurnSkipped(state.players[0].id.clone()));
                state.advance_turn();
            }
            CardKind::Reverse => {
                if state.players.len() == 2 {
                    // With two players a reverse is a skip.
                    state
                        .events
                        .push_back(GameEvent::TurnSkipped(state.players[0].id.clone()));
                    state.advance_turn();
                } else {
                    state.direction = -1;
                    state.turn_index = state.players.len() - 1;
                    state.events.push_back(GameEvent::DirectionReversed);
                }
            }
            _ => {}
        }

        debug!(
            "started game {} with {} players, {} up",
            state.id,
            state.players.len(),
            state.discard.top().map(ToString::to_string).unwrap_or_default(),
        );
        Ok(state)
    }

    /// Whether `player` may play `card` right now. Assumes it is the
    /// player's turn; `play_card` checks turn ownership separately.
    #[must_use]
    pub fn is_legal_play(&self, player: &Player, card: &Card) -> bool {
        match self.turn_state {
            // A player sitting on a drawn card may only play that card.
            TurnState::AwaitingDrawnCard(drawn_id) => {
                if card.id != drawn_id {
                    return false;
                }
            }
            TurnState::Playing => {
                if !player.holds(card.id) {
                    return false;
                }
            }
        }
        let Some(top) = self.discard.top() else {
            return true;
        };
        if card.kind == CardKind::WildDraw4 && self.config.enforce_wild_draw4_restriction {
            // Only playable when nothing else in hand matches the
            // current color.
            let has_color_match = player
                .hand
                .iter()
                .any(|c| c.id != card.id && c.color == self.current_color);
            if has_color_match {
                return false;
            }
        }
        if card.is_wild() {
            return true;
        }
        if card.color == self.current_color {
            return true;
        }
        if card.kind == top.kind && card.kind != CardKind::Number {
            return true;
        }
        card.kind == CardKind::Number && top.kind == CardKind::Number && card.value == top.value
    }

    /// Play a card from the current player's hand, applying its turn
    /// effect. Wild plays must carry a non-wild `chosen_color`.
    pub fn play_card<R: Rng + ?Sized>(
        &mut self,
        player_id: &PlayerId,
        card_id: CardId,
        chosen_color: Option<CardColor>,
        rng: &mut R,
    ) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        let position = self.player_position(player_id)?;
        self.ensure_turn(position)?;
        let card_idx = self.players[position]
            .hand
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(ActionError::CardNotInHand)?;
        let card = self.players[position].hand[card_idx];
        if !self.is_legal_play(&self.players[position], &card) {
            return Err(ActionError::IllegalMove);
        }
        // The color choice is validated up front so a declined play
        // mutates nothing.
        let next_color = if card.is_wild() {
            match chosen_color {
                Some(color) if color != CardColor::Wild => color,
                _ => return Err(ActionError::MustChooseColor),
            }
        } else {
            card.color
        };

        self.players[position].hand.remove(card_idx);
        self.discard.push(card);
        self.turn_state = TurnState::Playing;
        self.current_color = next_color;
        if self.players[position].hand.len() > 1 {
            self.players[position].uno_called = false;
        }
        self.events
            .push_back(GameEvent::CardPlayed(player_id.clone(), card));

        match card.kind {
            CardKind::Skip => {
                self.advance_turn();
                self.events
                    .push_back(GameEvent::TurnSkipped(self.players[self.turn_index].id.clone()));
                self.advance_turn();
            }
            CardKind::Reverse => {
                if self.players.len() == 2 {
                    // With two players a reverse is a skip.
                    self.advance_turn();
                    self.events
                        .push_back(GameEvent::TurnSkipped(self.players[self.turn_index].id.clone()));
                    self.advance_turn();
                } else {
                    self.direction = -self.direction;
                    self.events.push_back(GameEvent::DirectionReversed);
                    self.advance_turn();
                }
            }
            CardKind::Draw2 => {
                self.advance_turn();
                let drawn = self.force_draw(self.turn_index, 2, rng);
                if drawn > 0 {
                    self.events.push_back(GameEvent::CardsDrawn(
                        self.players[self.turn_index].id.clone(),
                        drawn,
                    ));
                }
                self.advance_turn();
            }
            CardKind::WildDraw4 => {
                self.advance_turn();
                let drawn = self.force_draw(self.turn_index, 4, rng);
                if drawn > 0 {
                    self.events.push_back(GameEvent::CardsDrawn(
                        self.players[self.turn_index].id.clone(),
                        drawn,
                    ));
                }
                self.advance_turn();
            }
            _ => self.advance_turn(),
        }
        self.last_action_at = Utc::now();

        if self.players[position].hand.is_empty() {
            let finished = self.players[position].id.clone();
            debug!("game {}: {finished} emptied their hand", self.id);
            self.winner_order.push(finished.clone());
            self.events.push_back(GameEvent::PlayerFinished(finished));
            return Ok(Transition::GameOver);
        }
        Ok(Transition::NextTurn)
    }

    /// Draw one card. If it is playable the player keeps the turn and
    /// must play that exact card or pass; otherwise the turn advances.
    /// A fully exhausted supply yields no card and still advances.
    pub fn draw_card<R: Rng + ?Sized>(
        &mut self,
        player_id: &PlayerId,
        rng: &mut R,
    ) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        let position = self.player_position(player_id)?;
        self.ensure_turn(position)?;
        if matches!(self.turn_state, TurnState::AwaitingDrawnCard(_)) {
            return Err(ActionError::AlreadyDrawn);
        }

        match self.draw_one(rng) {
            Some(card) => {
                self.players[position].hand.push(card);
                if self.players[position].hand.len() > 1 {
                    self.players[position].uno_called = false;
                }
                self.events
                    .push_back(GameEvent::CardsDrawn(player_id.clone(), 1));
                if self.is_legal_play(&self.players[position], &card) {
                    self.turn_state = TurnState::AwaitingDrawnCard(card.id);
                } else {
                    self.advance_turn();
                }
            }
            None => {
                warn!("game {}: deck and discard exhausted, {player_id} draws nothing", self.id);
                self.advance_turn();
            }
        }
        self.last_action_at = Utc::now();
        Ok(Transition::NextTurn)
    }

    /// Decline to play the just-drawn card. Only legal after a draw
    /// this turn.
    pub fn pass_turn(&mut self, player_id: &PlayerId) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        let position = self.player_position(player_id)?;
        self.ensure_turn(position)?;
        if !matches!(self.turn_state, TurnState::AwaitingDrawnCard(_)) {
            return Err(ActionError::CannotPassWithoutDrawing);
        }
        self.turn_state = TurnState::Playing;
        self.advance_turn();
        self.last_action_at = Utc::now();
        Ok(Transition::NextTurn)
    }

    /// Self-declare UNO. May be called slightly early (two cards in
    /// hand), anticipating the final play.
    pub fn call_uno(&mut self, player_id: &PlayerId) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        let position = self.player_position(player_id)?;
        if self.players[position].hand.len() > 2 {
            return Err(ActionError::TooManyCardsToCallUno);
        }
        self.players[position].uno_called = true;
        self.events.push_back(GameEvent::UnoCalled(player_id.clone()));
        self.last_action_at = Utc::now();
        Ok(Transition::NextTurn)
    }

    /// Accuse `target_id` of holding one card without calling UNO. On
    /// a hit the target draws the configured penalty; otherwise the
    /// accusation is declined and the target reported safe.
    pub fn catch_uno_failure<R: Rng + ?Sized>(
        &mut self,
        accuser_id: &PlayerId,
        target_id: &PlayerId,
        rng: &mut R,
    ) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        // Only existence is checked; self-accusation is not forbidden.
        let _ = self.player_position(accuser_id)?;
        let target = self.player_position(target_id)?;
        if self.players[target].hand.len() != 1 || self.players[target].uno_called {
            return Err(ActionError::PlayerIsSafe);
        }
        let drawn = self.force_draw(target, self.config.uno_penalty_draws, rng);
        self.events
            .push_back(GameEvent::UnoPenalty(target_id.clone(), drawn));
        self.last_action_at = Utc::now();
        Ok(Transition::NextTurn)
    }

    /// The first player to have emptied their hand, if any. Whether a
    /// recorded winner ends the wider game is the caller's policy.
    #[must_use]
    pub fn check_winner(&self) -> Option<&PlayerId> {
        self.winner_order.first()
    }

    #[must_use]
    pub fn current_player(&self) -> &Player {
        &self.players[self.turn_index]
    }

    #[must_use]
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    #[must_use]
    pub fn discard_top(&self) -> Option<&Card> {
        self.discard.top()
    }

    #[must_use]
    pub fn discard_count(&self) -> usize {
        self.discard.len()
    }

    #[must_use]
    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    /// Cards across all hands, the deck, and the discard pile. Always
    /// the full 108-card universe.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        let in_hands: usize = self.players.iter().map(|p| p.hand.len()).sum();
        in_hands + self.deck.len() + self.discard.len()
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn player_position(&self, player_id: &PlayerId) -> Result<usize, ActionError> {
        self.players
            .iter()
            .position(|p| &p.id == player_id)
            .ok_or(ActionError::PlayerNotFound)
    }

    fn ensure_turn(&self, position: usize) -> Result<(), ActionError> {
        if position != self.turn_index {
            return Err(ActionError::NotYourTurn);
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), ActionError> {
        if !self.winner_order.is_empty() {
            return Err(ActionError::HandFinished);
        }
        Ok(())
    }

    /// Move the turn by `direction`, reset the per-turn state, and
    /// clear a stale UNO call on the incoming player.
    fn advance_turn(&mut self) {
        let n = self.players.len() as i32;
        self.turn_index = (self.turn_index as i32 + self.direction).rem_euclid(n) as usize;
        self.turn_state = TurnState::Playing;
        let player = &mut self.players[self.turn_index];
        if player.hand.len() > 1 {
            player.uno_called = false;
        }
    }

    /// Take one card from the deck, recycling the discard pile first
    /// if the deck is empty. `None` when both are exhausted.
    fn draw_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Card> {
        if self.deck.is_empty() {
            let recycled = self.deck.replenish_from(&mut self.discard, rng);
            if recycled > 0 {
                debug!("game {}: recycled {recycled} cards into the deck", self.id);
                self.events.push_back(GameEvent::DeckReplenished(recycled));
            }
        }
        self.deck.draw()
    }

    /// Give `count` cards to the player at `position`, drawing as many
    /// as the supply allows. Returns the number actually drawn.
    fn force_draw<R: Rng + ?Sized>(&mut self, position: usize, count: usize, rng: &mut R) -> usize {
        let mut drawn = 0;
        for _ in 0..count {
            let Some(card) = self.draw_one(rng) else { break };
            self.players[position].hand.push(card);
            drawn += 1;
        }
        let player = &mut self.players[position];
        if player.hand.len() > 1 {
            player.uno_called = false;
        }
        drawn
    }
}
