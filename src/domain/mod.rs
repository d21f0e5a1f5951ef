//! Pure game rules. No transport or storage concerns in here.

pub mod cards;
pub mod cards_parsing;
mod cards_serde;
pub mod cheat;
pub mod deck;
pub mod game;
pub mod player;
pub mod snapshot;
pub mod table;

pub use cards::{card_beats, Card, Rank, Suit};
pub use cards_parsing::try_parse_cards;
pub use cheat::{Cheat, CheatKind, CHEAT_WINDOW};
pub use deck::{lowest_rank_for, Deck};
pub use game::{
    CallOutOutcome, DurakGame, GameId, PassOutcome, RoundOutcome, ThrowOutcome,
    DEFAULT_CARDS_PER_PLAYER,
};
pub use player::{ConnectionId, Player};
pub use snapshot::{GameSnapshot, PlayerView, PrivateSnapshot, TableEntryView};
pub use table::{Table, TableEntry};

#[cfg(test)]
pub(crate) mod test_helpers;
#[cfg(test)]
mod tests_break;
#[cfg(test)]
mod tests_throw;
