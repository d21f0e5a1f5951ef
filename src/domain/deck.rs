//! Deck construction, shuffling, and draw/insert operations.
//!
//! The top of the deck is the end of the backing vector: `draw` pops from
//! the end, the revealed trump card goes back in at index 0 so it is the
//! last card dealt.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::cards::{Card, Rank, Suit};
use crate::errors::domain::{DomainError, ValidationKind};

/// Lowest-rank threshold keeping deck size proportionate to the table:
/// fewer seats start the deck from a higher rank.
pub fn lowest_rank_for(seated: usize) -> Rank {
    if seated >= 6 {
        return Rank::Two;
    }
    let value = 8u8.saturating_sub(seated as u8);
    // seated in 0..6 gives values 8 down to 3, all valid ranks
    Rank::from_value(value).unwrap_or(Rank::Two)
}

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// One card per (suit, rank) pair for every rank >= `lowest_rank`.
    pub fn new(lowest_rank: Rank) -> Self {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                if rank >= lowest_rank {
                    cards.push(Card::new(suit, rank));
                }
            }
        }
        Self { cards }
    }

    /// A deck with no cards; games hold one of these before dealing.
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    /// Randomize order in place.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    /// Deterministic shuffle for reproducible deals.
    pub fn shuffle_with_seed(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.cards.shuffle(&mut rng);
    }

    /// Remove and return the top card.
    pub fn draw(&mut self) -> Result<Card, DomainError> {
        self.cards
            .pop()
            .ok_or_else(|| DomainError::validation(ValidationKind::EmptyDeck, "deck is empty"))
    }

    /// Slide a card under the deck; it will be drawn last.
    pub fn add_to_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    /// The card that will be drawn last, if any.
    pub fn bottom(&self) -> Option<Card> {
        self.cards.first().copied()
    }

    /// Stack cards on top of the deck.
    pub fn insert_at_top(&mut self, cards: &[Card]) {
        self.cards.extend_from_slice(cards);
    }

    /// Strip the named cards out of the deck, wherever they sit.
    pub fn remove_cards(&mut self, cards: &[Card]) {
        self.cards.retain(|c| !cards.contains(c));
    }

    /// Replace the backing order wholesale; last element is the top.
    #[cfg(test)]
    pub(crate) fn set_cards_for_tests(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }
}
