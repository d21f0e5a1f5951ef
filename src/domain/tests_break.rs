//! Breaking: covering single cards, moving tops, neighbor permission,
//! and the full-break declaration.

use super::cards::Suit;
use super::game::DurakGame;
use super::test_helpers::{card, cards, three_seat_round, two_seat_round};
use crate::errors::domain::{DomainError, ValidationKind};

#[test]
fn only_the_defender_breaks() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();

    let err = game
        .break_card("vera", card("7H"), card("9C"))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::OutOfTurn, _)
    ));

    game.break_card("boris", card("7H"), card("8H")).unwrap();
    assert_eq!(game.hand_of("boris").unwrap().len(), 5);
    assert!(game.table().all_broken());
}

#[test]
fn break_card_validates_top_and_bottom() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();

    // Defender must hold the covering card.
    let err = game
        .break_card("boris", card("7H"), card("9C"))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::CardNotHeld, _)
    ));

    // The bottom card must actually be on the table.
    let err = game
        .break_card("boris", card("9D"), card("8H"))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::CardNotOnTable, _)
    ));

    // A broken entry stays broken.
    game.break_card("boris", card("7H"), card("8H")).unwrap();
    let err = game
        .break_card("boris", card("7H"), card("13H"))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::CardAlreadyBroken, _)
    ));
    assert_eq!(game.hand_of("boris").unwrap().len(), 5);
}

#[test]
fn defender_may_rearrange_tops() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H", "7C"])).unwrap();
    game.break_card("boris", card("7H"), card("8H")).unwrap();

    let err = game
        .move_top_card("anna", card("8H"), card("7C"))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::OutOfTurn, _)
    ));

    game.move_top_card("boris", card("8H"), card("7C")).unwrap();
    assert!(game.table().is_open(card("7H")));
    assert!(!game.table().is_open(card("7C")));
}

#[test]
fn allowing_the_break_is_for_neighbors_only() {
    let mut game = DurakGame::new(7, "test");
    game.setup_round_for_tests(&["anna", "boris", "vera", "dima"], Suit::Spades, 6);

    let err = game.allow_break_cards("dima").unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::OutOfTurn, _)
    ));
    assert!(game.allow_break_cards("boris").is_err());

    game.allow_break_cards("anna").unwrap();
    assert!(game.prev_allows_break());
    assert!(!game.next_allows_break());

    game.allow_break_cards("vera").unwrap();
    assert!(game.next_allows_break());

    // Re-allowing changes nothing.
    game.allow_break_cards("vera").unwrap();
    assert!(game.next_allows_break() && game.prev_allows_break());
}

#[test]
fn full_break_needs_both_permissions() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();
    game.break_card("boris", card("7H"), card("8H")).unwrap();

    let err = game.break_cards("boris").unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::BreakNotAllowed, _)
    ));

    game.allow_break_cards("anna").unwrap();
    assert!(game.break_cards("boris").is_err());

    game.allow_break_cards("vera").unwrap();
    game.break_cards("boris").unwrap();
}

#[test]
fn full_break_rejects_an_uncovered_table() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H", "7C"])).unwrap();
    game.break_card("boris", card("7H"), card("8H")).unwrap();
    game.allow_break_cards("anna").unwrap();
    game.allow_break_cards("vera").unwrap();

    let err = game.break_cards("boris").unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::IllegalBreak, _)
    ));
    // The table survives the refusal.
    assert_eq!(game.table().entries().len(), 2);
    assert_eq!(game.defender(), Some("boris"));
}

#[test]
fn full_break_rejects_tops_that_do_not_beat() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["7H"])).unwrap();
    // 7D neither follows suit nor trumps; placing it is allowed, the
    // declaration is not.
    game.break_card("boris", card("7H"), card("7D")).unwrap();
    game.allow_break_cards("anna").unwrap();
    game.allow_break_cards("vera").unwrap();

    assert!(!game.is_legal_break_cards());
    let err = game.break_cards("boris").unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::IllegalBreak, _)
    ));
}

#[test]
fn trump_covers_any_offsuit_bottom() {
    let mut game = three_seat_round();
    game.throw_cards("anna", &cards(&["14C"])).unwrap();
    // 9S is trump and beats the ace of clubs.
    game.break_card("boris", card("14C"), card("9S")).unwrap();
    assert!(game.is_legal_break_cards());
}

#[test]
fn empty_table_cannot_be_broken() {
    let mut game = three_seat_round();
    game.allow_break_cards("anna").unwrap();
    game.allow_break_cards("vera").unwrap();
    let err = game.break_cards("boris").unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::TableEmpty, _)
    ));
}

#[test]
fn two_seats_grant_both_permissions_at_once() {
    let mut game = two_seat_round();
    game.throw_cards("boris", &cards(&["9C"])).unwrap();
    game.break_card("anna", card("9C"), card("10C")).unwrap();

    game.allow_break_cards("boris").unwrap();
    assert!(game.next_allows_break() && game.prev_allows_break());
    game.break_cards("anna").unwrap();
}
