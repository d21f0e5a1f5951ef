//! Core card types: Card, Rank, Suit.

use std::cmp::Ordering;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Suit {
    Hearts,
    Clubs,
    Diamonds,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Clubs, Suit::Diamonds, Suit::Spades];

    /// Single-letter wire form: H/C/D/S.
    pub fn letter(self) -> char {
        match self {
            Suit::Hearts => 'H',
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Spades => 'S',
        }
    }

    pub fn from_letter(letter: char) -> Option<Suit> {
        match letter {
            'H' => Some(Suit::Hearts),
            'C' => Some(Suit::Clubs),
            'D' => Some(Suit::Diamonds),
            'S' => Some(Suit::Spades),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Numeric value, 2..=14. Ace is 14 and beats King.
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Rank> {
        Rank::ALL.iter().copied().find(|r| r.value() == value)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }
}

// Note: Ord on Card is strength ordering and compares rank only. Outside
// trump rules a 7 of any suit equals a 7 of another suit; Eq (suit+rank)
// stays the identity check.
impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank)
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Whether `top` beats `bottom` under trump/rank rules: a strictly higher
/// rank of the same suit, or any trump over a non-trump. A trump bottom
/// card is only beaten by a strictly higher trump.
pub fn card_beats(bottom: Card, top: Card, trump: Suit) -> bool {
    let bottom_trump = bottom.suit == trump;
    let top_trump = top.suit == trump;
    if top_trump && !bottom_trump {
        return true;
    }
    if bottom_trump && !top_trump {
        return false;
    }
    bottom.suit == top.suit && top.rank > bottom.rank
}
