//! A self-playing Monopoly engine: a fixed 40-tile board, card decks with a
//! small effect-command grammar, an asset-valuation trade broker, and a turn
//! loop that runs games to bankruptcy or a turn-limit stalemate. Drivers
//! construct a [`game::GameState`], pump [`game::GameState::advance_one_turn`],
//! and drain [`events::GameEvent`]s to watch what happened.

pub mod board;
pub mod broker;
pub mod cards;
pub mod dice;
pub mod events;
pub mod game;
pub mod player;
