//! Throwing: turn order, rank legality, overload, and the illegal-throw
//! cheat path.

use super::cards::Suit;
use super::game::DurakGame;
use super::test_helpers::{card, cards, three_seat_round, two_seat_round};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};

fn four_seat_round() -> DurakGame {
    let mut game = DurakGame::new(4, "test");
    game.setup_round_for_tests(&["anna", "boris", "vera", "dima"], Suit::Spades, 6);
    game.set_hand_for_tests("anna", cards(&["7H", "7C", "9D", "11H"]));
    game.set_hand_for_tests("boris", cards(&["8H", "10C", "9S", "12D", "13H", "7D"]));
    game.set_hand_for_tests("vera", cards(&["7S", "9C", "10D", "11C"]));
    game.set_hand_for_tests("dima", cards(&["8C", "8D", "10H", "12S"]));
    game
}

#[test]
fn first_throw_belongs_to_the_seat_before_the_defender() {
    let mut game = three_seat_round();
    let err = game.throw_cards("vera", &cards(&["7S"])).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::OutOfTurn, _)
    ));
    assert!(game.table().is_empty());

    let outcome = game.throw_cards("anna", &cards(&["7H"])).unwrap();
    assert!(!outcome.cheat_recorded);
    assert!(game.throwing_started());
    assert_eq!(game.table().entries().len(), 1);
    assert_eq!(game.hand_of("anna").unwrap().len(), 5);
}

#[test]
fn first_throw_must_be_a_single_rank() {
    let mut game = three_seat_round();
    let err = game
        .throw_cards("anna", &cards(&["7H", "9D"]))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::RankMismatch, _)
    ));
    assert!(game.table().is_empty());
    assert_eq!(game.hand_of("anna").unwrap().len(), 6);

    game.throw_cards("anna", &cards(&["7H", "7C"])).unwrap();
    assert_eq!(game.table().entries().len(), 2);
}

#[test]
fn defender_cannot_throw() {
    let mut game = three_seat_round();
    let err = game.throw_cards("boris", &cards(&["8H"])).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::OutOfTurn, _)
    ));
}

#[test]
fn throw_validates_input_cards() {
    let mut game = three_seat_round();
    let err = game.throw_cards("anna", &[]).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::NoCards, _)
    ));

    // 14H belongs to vera, not anna.
    let err = game.throw_cards("anna", &cards(&["14H"])).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::CardNotHeld, _)
    ));

    let err = game.throw_cards("grisha", &cards(&["7H"])).unwrap_err();
    assert!(matches!(
        err,
        DomainError::NotFound(NotFoundKind::Player, _)
    ));
}

#[test]
fn throw_respects_the_defenders_capacity() {
    let mut game = two_seat_round();
    game.set_hand_for_tests("anna", cards(&["10C"]));

    let err = game
        .throw_cards("boris", &cards(&["9C", "9D"]))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::DefenderOverloaded, _)
    ));
    assert_eq!(game.hand_of("boris").unwrap().len(), 4);

    game.throw_cards("boris", &cards(&["9C"])).unwrap();
}

#[test]
fn later_throws_come_only_from_the_defenders_neighbors() {
    let mut game = four_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();

    // dima sits across the table; matching rank does not help.
    let err = game.throw_cards("dima", &cards(&["10H"])).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::OutOfTurn, _)
    ));
    assert_eq!(game.hand_of("dima").unwrap().len(), 4);

    // vera is the seat after the defender and may pile on.
    let outcome = game.throw_cards("vera", &cards(&["7S"])).unwrap();
    assert!(!outcome.cheat_recorded);
    assert_eq!(game.table().entries().len(), 2);
}

#[test]
fn matching_rank_on_tops_counts_too() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();
    game.break_card("boris", card("7H"), card("8H")).unwrap();

    // Rank 8 only appears as a top card; still a legal throw.
    let outcome = game.throw_cards("vera", &cards(&["9C"])).unwrap();
    assert!(outcome.cheat_recorded);

    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();
    game.break_card("boris", card("7H"), card("8H")).unwrap();
    game.set_hand_for_tests("vera", cards(&["8C", "9C"]));
    let outcome = game.throw_cards("vera", &cards(&["8C"])).unwrap();
    assert!(!outcome.cheat_recorded);
}

#[test]
fn offrank_throw_is_absorbed_as_a_cheat() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();

    let outcome = game.throw_cards("vera", &cards(&["9C"])).unwrap();
    assert!(outcome.cheat_recorded);
    assert!(game.has_active_cheat("vera"));
    // The cards still land on the table.
    assert_eq!(game.table().entries().len(), 2);
    assert_eq!(game.hand_of("vera").unwrap().len(), 3);
}

#[test]
fn second_cheat_while_one_is_open_is_refused() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();
    game.throw_cards("vera", &cards(&["9C"])).unwrap();

    let err = game.throw_cards("vera", &cards(&["10D"])).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::CheatOutstanding, _)
    ));
    // Refused outright: nothing moved.
    assert_eq!(game.table().entries().len(), 2);
    assert_eq!(game.hand_of("vera").unwrap().len(), 3);
}
