//! Card parsing and printing for the `<rank><suit>` wire form.
//!
//! The rank prints as its numeric value, so tokens run "2H" through "14S"
//! ("7H" is the seven of hearts, "11C" the jack of clubs).

use std::fmt;
use std::str::FromStr;

use super::cards::{Card, Rank, Suit};
use crate::errors::domain::{DomainError, ValidationKind};

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.value(), self.suit.letter())
    }
}

impl FromStr for Card {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || {
            DomainError::validation(ValidationKind::ParseCard, format!("parse card: {s:?}"))
        };
        if s.len() < 2 || !s.is_ascii() {
            return Err(parse_err());
        }
        let (value_str, suit_str) = s.split_at(s.len() - 1);
        let suit = suit_str
            .chars()
            .next()
            .and_then(Suit::from_letter)
            .ok_or_else(parse_err)?;
        let value: u8 = value_str.parse().map_err(|_| parse_err())?;
        let rank = Rank::from_value(value).ok_or_else(parse_err)?;
        Ok(Card { suit, rank })
    }
}

/// Parse card tokens (e.g. "7H", "14S") into Card values.
/// Fails on the first invalid token.
pub fn try_parse_cards<I, S>(tokens: I) -> Result<Vec<Card>, DomainError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|s| s.as_ref().parse::<Card>())
        .collect()
}
