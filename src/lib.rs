//! Authoritative rules engine for multiplayer UNO.
//!
//! The engine owns the full game state for one hand: the shuffled
//! 108-card deck, every player's hand, the discard pile, turn order,
//! and the UNO-call bookkeeping. Callers (a lobby or room server) feed
//! player actions in; every action is validated before any mutation,
//! so a declined action leaves the state exactly as it was. Presenting
//! per-player redacted views, timers, and transport are the caller's
//! job.
//!
//! ```
//! use uno_engine::game::{PlayerId, UnoConfig, UnoState};
//!
//! let players = vec![
//!     (PlayerId::new("alice"), "Alice".to_string()),
//!     (PlayerId::new("bob"), "Bob".to_string()),
//! ];
//! let mut state = UnoState::new(&players, UnoConfig::default()).unwrap();
//!
//! assert_eq!(state.total_cards(), 108);
//! let current = state.current_player().id.clone();
//! // The current player can always at least draw.
//! state.draw_card(&current, &mut rand::rng()).unwrap();
//! for event in state.drain_events() {
//!     println!("{event}");
//! }
//! ```

pub mod game;

pub use game::{ActionError, Transition, UnoConfig, UnoState};
