//! Per-seat player state: username identity and an owned hand.

use super::cards::Card;
use crate::errors::domain::{DomainError, ValidationKind};

/// Opaque transport token for directed messaging. The engine stores it on
/// join and never reads it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ConnectionId(pub u64);

#[derive(Debug, Clone)]
pub struct Player {
    username: String,
    hand: Vec<Card>,
    pub connection: Option<ConnectionId>,
}

impl Player {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            hand: Vec::new(),
            connection: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn card_count(&self) -> usize {
        self.hand.len()
    }

    pub fn has_card(&self, card: Card) -> bool {
        self.hand.contains(&card)
    }

    pub fn add_cards(&mut self, cards: &[Card]) {
        self.hand.extend_from_slice(cards);
    }

    pub fn add_card(&mut self, card: Card) {
        self.hand.push(card);
    }

    /// Remove each card by value. All-or-nothing: every requested card must
    /// be present (counting duplicates) or the hand is left untouched.
    pub fn remove_cards(&mut self, cards: &[Card]) -> Result<(), DomainError> {
        let mut picked: Vec<usize> = Vec::with_capacity(cards.len());
        for card in cards {
            let pos = self
                .hand
                .iter()
                .enumerate()
                .find(|(i, c)| *c == card && !picked.contains(i))
                .map(|(i, _)| i);
            match pos {
                Some(i) => picked.push(i),
                None => {
                    return Err(DomainError::validation(
                        ValidationKind::CardNotHeld,
                        format!("{} does not hold {card}", self.username),
                    ));
                }
            }
        }
        // Back-to-front removal keeps the earlier indices valid and the
        // rest of the hand in order.
        picked.sort_unstable();
        for i in picked.into_iter().rev() {
            self.hand.remove(i);
        }
        Ok(())
    }

    pub fn clear_hand(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.hand)
    }
}

// Username is the identity across the game.
impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Eq for Player {}
