//! Cheat ledger records: an in-flight rule violation with a time-bounded
//! rollback window.
//!
//! A record carries only the data its own rollback needs; the game passes
//! its table/deck/hands into the rollback explicitly (no back-pointer).

use std::time::{Duration, Instant};

use super::cards::Card;

/// Window during which another player may call the cheat out.
pub const CHEAT_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheatKind {
    /// Swapped an own card for the face-up trump card.
    StealTrumpCard { original_trump: Card, swapped: Card },
    /// Stuffed own cards into the deck.
    PutIntoDeck { cards: Vec<Card> },
    /// Forced an ill-ranked throw through.
    ThrowIllegalCards { cards: Vec<Card> },
    /// Forced an ill-ranked pass through.
    PassIllegalCards { cards: Vec<Card> },
}

#[derive(Debug, Clone)]
pub struct Cheat {
    player: String,
    expires_at: Instant,
    kind: CheatKind,
}

impl Cheat {
    pub fn new(player: impl Into<String>, kind: CheatKind, now: Instant) -> Self {
        Self {
            player: player.into(),
            expires_at: now + CHEAT_WINDOW,
            kind,
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn kind(&self) -> &CheatKind {
        &self.kind
    }

    /// Rollback is permitted strictly before the window's end.
    pub fn can_rollback(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        !self.can_rollback(now)
    }

    #[cfg(test)]
    pub fn expired_for_tests(player: impl Into<String>, kind: CheatKind) -> Self {
        let now = Instant::now();
        Self {
            player: player.into(),
            expires_at: now - Duration::from_secs(1),
            kind,
        }
    }
}
