//! Serializable read views of a game, shaped for transport layers.
//!
//! The public snapshot hides hands; a player asks for their own hand
//! separately so broadcasting one snapshot to the whole table stays safe.

use serde::{Deserialize, Serialize};

use super::cards::{Card, Suit};
use super::game::{DurakGame, GameId};
use super::table::Table;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableEntryView {
    pub bottom: Card,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Card>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub username: String,
    pub card_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub id: GameId,
    pub name: String,
    pub in_progress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trump: Option<Suit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trump_card: Option<Card>,
    pub deck_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defender: Option<String>,
    pub table: Vec<TableEntryView>,
    /// Seated players in cyclic order.
    pub players: Vec<PlayerView>,
    pub lobby: Vec<String>,
    pub next_allows_break: bool,
    pub prev_allows_break: bool,
    pub throwing_started: bool,
}

fn table_view(table: &Table) -> Vec<TableEntryView> {
    table
        .entries()
        .iter()
        .map(|e| TableEntryView {
            bottom: e.bottom,
            top: e.top,
        })
        .collect()
}

impl GameSnapshot {
    pub fn of(game: &DurakGame) -> Self {
        Self {
            id: game.id(),
            name: game.name().to_string(),
            in_progress: game.is_in_progress(),
            trump: game.trump(),
            trump_card: game.trump_card(),
            deck_count: game.deck_count(),
            defender: game.defender().map(str::to_string),
            table: table_view(game.table()),
            players: game
                .players()
                .iter()
                .map(|p| PlayerView {
                    username: p.username().to_string(),
                    card_count: p.card_count(),
                })
                .collect(),
            lobby: game.lobby().iter().map(|p| p.username().to_string()).collect(),
            next_allows_break: game.next_allows_break(),
            prev_allows_break: game.prev_allows_break(),
            throwing_started: game.throwing_started(),
        }
    }
}

/// One player's private view: the shared snapshot plus their own hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivateSnapshot {
    #[serde(flatten)]
    pub game: GameSnapshot,
    pub hand: Vec<Card>,
}

impl PrivateSnapshot {
    pub fn of(game: &DurakGame, username: &str) -> Self {
        Self {
            game: GameSnapshot::of(game),
            hand: game.hand_of(username).map(<[Card]>::to_vec).unwrap_or_default(),
        }
    }
}
