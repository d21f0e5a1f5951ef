//! Builders shared by the action tests: parse card tokens tersely and
//! assemble mid-round positions without going through a shuffled deal.

use super::cards::{Card, Suit};
use super::game::DurakGame;

pub(crate) fn card(token: &str) -> Card {
    token.parse().expect("valid card token")
}

pub(crate) fn cards(tokens: &[&str]) -> Vec<Card> {
    tokens.iter().map(|t| card(t)).collect()
}

/// Three seats mid-round: anna, boris, vera in cyclic order, spades
/// trump, boris defending. Anna sits before boris (opens the round),
/// vera sits after him. Hands are fixed, the deck is empty.
pub(crate) fn three_seat_round() -> DurakGame {
    let mut game = DurakGame::new(1, "test");
    game.setup_round_for_tests(&["anna", "boris", "vera"], Suit::Spades, 6);
    game.set_hand_for_tests("anna", cards(&["7H", "7C", "9D", "11H", "14C", "2S"]));
    game.set_hand_for_tests("boris", cards(&["8H", "10C", "9S", "12D", "13H", "7D"]));
    game.set_hand_for_tests("vera", cards(&["7S", "9C", "10D", "11C", "14H", "3S"]));
    game
}

/// Two seats mid-round: anna defends against boris, hearts trump,
/// empty deck.
pub(crate) fn two_seat_round() -> DurakGame {
    let mut game = DurakGame::new(2, "test");
    game.setup_round_for_tests(&["boris", "anna"], Suit::Hearts, 6);
    game.set_hand_for_tests("boris", cards(&["9C", "9D", "10S", "12C"]));
    game.set_hand_for_tests("anna", cards(&["10C", "11D", "6H", "13S"]));
    game
}
