//! The `DurakGame` aggregate: seating, deck, table, turn rotation, and
//! every action a seat can take during a round.
//!
//! `defender` is the receiving seat of the round; the other seats throw
//! cards at it. All action methods are all-or-nothing: an `Err` leaves
//! the game untouched.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::cards::{card_beats, Card, Rank, Suit};
use super::cheat::{Cheat, CheatKind};
use super::deck::{lowest_rank_for, Deck};
use super::player::{ConnectionId, Player};
use super::table::Table;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};

pub type GameId = u16;

pub const DEFAULT_CARDS_PER_PLAYER: usize = 6;

/// Result of a throw or pass that may have been absorbed as a cheat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowOutcome {
    pub cheat_recorded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub cheat_recorded: bool,
    /// The seat now defending.
    pub new_defender: String,
}

/// Result of an action that ended the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub game_over: bool,
    pub next_defender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutOutcome {
    /// Whether a cheat was undone (false for innocent or expired targets).
    pub rolled_back: bool,
}

#[derive(Debug)]
pub struct DurakGame {
    id: GameId,
    name: String,
    deck: Deck,
    /// Joined but not seated; seated between games.
    lobby: Vec<Player>,
    /// Actively seated, in fixed cyclic order.
    players: Vec<Player>,
    trump: Option<Suit>,
    trump_card: Option<Card>,
    cards_per_player: usize,
    defender: Option<String>,
    next_allows_break: bool,
    prev_allows_break: bool,
    throwing_started: bool,
    in_progress: bool,
    table: Table,
    cheats: HashMap<String, Cheat>,
    last_call_out: HashMap<String, Instant>,
    last_activity: Instant,
}

impl DurakGame {
    pub fn new(id: GameId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            deck: Deck::empty(),
            lobby: Vec::new(),
            players: Vec::new(),
            trump: None,
            trump_card: None,
            cards_per_player: 0,
            defender: None,
            next_allows_break: false,
            prev_allows_break: false,
            throwing_started: false,
            in_progress: false,
            table: Table::new(),
            cheats: HashMap::new(),
            last_call_out: HashMap::new(),
            last_activity: Instant::now(),
        }
    }

    // Read accessors -------------------------------------------------------

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn lobby_count(&self) -> usize {
        self.lobby.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn lobby(&self) -> &[Player] {
        &self.lobby
    }

    /// Look up a player by username across seats and lobby.
    pub fn get_player(&self, username: &str) -> Option<&Player> {
        self.players
            .iter()
            .chain(self.lobby.iter())
            .find(|p| p.username() == username)
    }

    pub fn hand_of(&self, username: &str) -> Option<&[Card]> {
        self.get_player(username).map(|p| p.hand())
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn trump(&self) -> Option<Suit> {
        self.trump
    }

    pub fn trump_card(&self) -> Option<Card> {
        self.trump_card
    }

    pub fn deck_count(&self) -> usize {
        self.deck.len()
    }

    pub fn cards_per_player(&self) -> usize {
        self.cards_per_player
    }

    /// The receiving seat of the current round.
    pub fn defender(&self) -> Option<&str> {
        self.defender.as_deref()
    }

    pub fn next_allows_break(&self) -> bool {
        self.next_allows_break
    }

    pub fn prev_allows_break(&self) -> bool {
        self.prev_allows_break
    }

    pub fn throwing_started(&self) -> bool {
        self.throwing_started
    }

    pub fn has_active_cheat(&self, username: &str) -> bool {
        let now = Instant::now();
        self.cheats
            .get(username)
            .is_some_and(|c| c.can_rollback(now))
    }

    /// Round-start timestamp; consumed by the registry's eviction sweep.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    // Lobby ----------------------------------------------------------------

    /// Join by username. Idempotent: joining twice is a no-op.
    pub fn add_player(&mut self, username: &str) {
        if self.get_player(username).is_none() {
            self.lobby.push(Player::new(username));
            debug!(game_id = self.id, player = username, "player joined lobby");
        }
    }

    /// Attach the transport's connection handle; the engine never reads it.
    pub fn connect(&mut self, username: &str, connection: ConnectionId) {
        if let Some(player) = self
            .players
            .iter_mut()
            .chain(self.lobby.iter_mut())
            .find(|p| p.username() == username)
        {
            player.connection = Some(connection);
        }
    }

    // Game lifecycle -------------------------------------------------------

    pub fn start_game(&mut self, cards_per_player: usize) -> Result<(), DomainError> {
        self.start_game_inner(cards_per_player, None)
    }

    /// Deterministic variant for reproducible deals.
    pub fn start_game_seeded(
        &mut self,
        cards_per_player: usize,
        seed: u64,
    ) -> Result<(), DomainError> {
        self.start_game_inner(cards_per_player, Some(seed))
    }

    fn start_game_inner(
        &mut self,
        cards_per_player: usize,
        seed: Option<u64>,
    ) -> Result<(), DomainError> {
        if self.in_progress {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "game already in progress",
            ));
        }
        let seated = self.players.len() + self.lobby.len();
        if seated < 2 {
            return Err(DomainError::validation(
                ValidationKind::NotEnoughPlayers,
                format!("{seated} player(s) cannot start a game"),
            ));
        }
        let mut deck = Deck::new(lowest_rank_for(seated));
        // One card must remain to reveal the trump.
        if seated * cards_per_player >= deck.len() {
            return Err(DomainError::validation(
                ValidationKind::NotEnoughCards,
                format!(
                    "{seated} players x {cards_per_player} cards exceed a {} card deck",
                    deck.len()
                ),
            ));
        }

        self.players.append(&mut self.lobby);
        self.cards_per_player = cards_per_player;
        match seed {
            Some(seed) => deck.shuffle_with_seed(seed),
            None => deck.shuffle(),
        }

        for player in &mut self.players {
            for _ in 0..cards_per_player {
                player.add_card(deck.draw()?);
            }
        }

        let trump_card = deck.draw()?;
        let trump = trump_card.suit;
        deck.add_to_bottom(trump_card);
        self.deck = deck;
        self.trump = Some(trump);
        self.trump_card = Some(trump_card);

        // The seat holding the lowest trump attacks first; the defender is
        // the seat after it. Without any trump in hand, seat 0 attacks.
        let mut attacker = 0usize;
        let mut lowest_trump: Option<Rank> = None;
        for (seat, player) in self.players.iter().enumerate() {
            for card in player.hand() {
                if card.suit == trump && lowest_trump.is_none_or(|lt| card.rank < lt) {
                    lowest_trump = Some(card.rank);
                    attacker = seat;
                }
            }
        }
        let defender_seat = (attacker + 1) % self.players.len();
        self.defender = Some(self.players[defender_seat].username().to_string());
        self.reset_round_state();
        self.in_progress = true;

        info!(
            game_id = self.id,
            players = self.players.len(),
            trump = ?trump,
            defender = self.defender.as_deref().unwrap_or(""),
            "game started"
        );
        Ok(())
    }

    // Throwing -------------------------------------------------------------

    /// The defender must be able to cover everything thrown.
    pub fn is_possible_throw_cards(&self, cards: &[Card]) -> bool {
        let Some(defender_seat) = self.defender_seat_opt() else {
            return false;
        };
        self.players[defender_seat].card_count() >= self.table.unbroken_count() + cards.len()
    }

    /// Thrower is a table-neighbor of the defender and every thrown rank
    /// already appears on the table.
    pub fn is_legal_throw_cards(&self, username: &str, cards: &[Card]) -> bool {
        let Some(thrower) = self.seat_of(username) else {
            return false;
        };
        let Some(defender_seat) = self.defender_seat_opt() else {
            return false;
        };
        let n = self.players.len();
        let is_neighbor =
            thrower == (defender_seat + 1) % n || thrower == (defender_seat + n - 1) % n;
        is_neighbor && cards.iter().all(|c| self.table.has_rank(c.rank))
    }

    /// An attacker throws cards at the defender. An ill-ranked non-first
    /// throw is absorbed as a `ThrowIllegalCards` cheat when the thrower
    /// has no open cheat, and rejected otherwise.
    pub fn throw_cards(
        &mut self,
        username: &str,
        cards: &[Card],
    ) -> Result<ThrowOutcome, DomainError> {
        self.require_in_progress()?;
        if cards.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::NoCards,
                "no cards thrown",
            ));
        }
        let thrower = self.seated_index(username)?;
        let defender_seat = self.defender_seat()?;
        if thrower == defender_seat {
            return Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                "the defender cannot throw",
            ));
        }
        self.require_held(thrower, cards)?;
        if !self.is_possible_throw_cards(cards) {
            return Err(DomainError::validation(
                ValidationKind::DefenderOverloaded,
                "defender cannot cover that many cards",
            ));
        }

        let n = self.players.len();
        let prev = (defender_seat + n - 1) % n;
        let mut cheat_recorded = false;
        if !self.throwing_started {
            // The round's mandatory first throw belongs to the seat before
            // the defender; anyone else is refused, not a cheat.
            if thrower != prev {
                return Err(DomainError::validation(
                    ValidationKind::OutOfTurn,
                    format!("{username} may not open the round"),
                ));
            }
            let first_rank = cards[0].rank;
            if !cards.iter().all(|c| c.rank == first_rank) {
                return Err(DomainError::validation(
                    ValidationKind::RankMismatch,
                    "first throw must be a single rank",
                ));
            }
        } else {
            let next = (defender_seat + 1) % n;
            if thrower != next && thrower != prev {
                return Err(DomainError::validation(
                    ValidationKind::OutOfTurn,
                    format!("{username} is not a neighbor of the defender"),
                ));
            }
            if !cards.iter().all(|c| self.table.has_rank(c.rank)) {
                self.record_cheat(
                    username,
                    CheatKind::ThrowIllegalCards {
                        cards: cards.to_vec(),
                    },
                )?;
                cheat_recorded = true;
            }
        }

        self.players[thrower].remove_cards(cards)?;
        for card in cards {
            self.table.throw(*card);
        }
        self.throwing_started = true;
        debug!(
            game_id = self.id,
            player = username,
            count = cards.len(),
            cheat = cheat_recorded,
            "cards thrown"
        );
        Ok(ThrowOutcome { cheat_recorded })
    }

    // Breaking -------------------------------------------------------------

    pub fn is_possible_break_card(&self, bottom: Card) -> bool {
        self.table.is_open(bottom)
    }

    /// Defender covers one bottom card.
    pub fn break_card(
        &mut self,
        username: &str,
        bottom: Card,
        top: Card,
    ) -> Result<(), DomainError> {
        self.require_in_progress()?;
        let defender_seat = self.require_defender(username)?;
        if !self.players[defender_seat].has_card(top) {
            return Err(DomainError::validation(
                ValidationKind::CardNotHeld,
                format!("{username} does not hold {top}"),
            ));
        }
        self.table.break_entry(bottom, top)?;
        self.players[defender_seat].remove_cards(&[top])?;
        debug!(game_id = self.id, player = username, %bottom, %top, "card broken");
        Ok(())
    }

    /// Every bottom card carries a top card that beats it under trump/rank
    /// rules.
    pub fn is_legal_break_cards(&self) -> bool {
        let Some(trump) = self.trump else {
            return false;
        };
        self.table
            .entries()
            .iter()
            .all(|e| e.top.is_some_and(|top| card_beats(e.bottom, top, trump)))
    }

    /// Defender's neighbors each grant permission for the full break.
    /// With two seats both roles coincide and one call sets both flags.
    pub fn allow_break_cards(&mut self, username: &str) -> Result<(), DomainError> {
        self.require_in_progress()?;
        let seat = self.seated_index(username)?;
        let defender_seat = self.defender_seat()?;
        let n = self.players.len();
        let mut matched = false;
        if seat == (defender_seat + 1) % n {
            self.next_allows_break = true;
            matched = true;
        }
        if seat == (defender_seat + n - 1) % n {
            self.prev_allows_break = true;
            matched = true;
        }
        if seat == defender_seat || !matched {
            return Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                format!("{username} is not a neighbor of the defender"),
            ));
        }
        Ok(())
    }

    /// Defender declares the whole table covered, ending the round in
    /// their favor.
    pub fn break_cards(&mut self, username: &str) -> Result<RoundOutcome, DomainError> {
        self.require_in_progress()?;
        self.require_defender(username)?;
        if self.table.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::TableEmpty,
                "nothing to break",
            ));
        }
        if !(self.next_allows_break && self.prev_allows_break) {
            return Err(DomainError::validation(
                ValidationKind::BreakNotAllowed,
                "both neighbors must allow the break",
            ));
        }
        if !self.is_legal_break_cards() {
            warn!(
                game_id = self.id,
                player = username,
                "illegal full-break declaration refused"
            );
            return Err(DomainError::validation(
                ValidationKind::IllegalBreak,
                "not every card on the table is beaten",
            ));
        }
        // Broken cards leave play.
        self.table.clear();
        info!(game_id = self.id, player = username, "table broken");
        self.finish_round(true)
    }

    /// Defender re-parents an already-placed top card onto a different
    /// open bottom card.
    pub fn move_top_card(
        &mut self,
        username: &str,
        top: Card,
        new_bottom: Card,
    ) -> Result<(), DomainError> {
        self.require_in_progress()?;
        self.require_defender(username)?;
        self.table.move_top(top, new_bottom)
    }

    // Taking ---------------------------------------------------------------

    /// Defender gives up and draws the whole table into their hand.
    pub fn take_cards(&mut self, username: &str) -> Result<RoundOutcome, DomainError> {
        self.require_in_progress()?;
        let defender_seat = self.require_defender(username)?;
        if self.table.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::TableEmpty,
                "nothing to take",
            ));
        }
        let cards = self.table.drain_all();
        self.players[defender_seat].add_cards(&cards);
        info!(
            game_id = self.id,
            player = username,
            count = cards.len(),
            "table taken"
        );
        self.finish_round(false)
    }

    // Passing on -----------------------------------------------------------

    /// No card may be broken yet and the next seat must be able to cover
    /// the table plus the passed cards.
    pub fn is_possible_pass_on(&self, cards: &[Card]) -> bool {
        let Some(defender_seat) = self.defender_seat_opt() else {
            return false;
        };
        if self.table.is_empty() || !self.table.all_open() {
            return false;
        }
        let next = (defender_seat + 1) % self.players.len();
        self.table.card_count() + cards.len() <= self.players[next].card_count()
    }

    /// All passed cards and all table bottoms share one rank.
    pub fn is_legal_pass_on(&self, cards: &[Card]) -> bool {
        self.table
            .common_bottom_rank()
            .is_some_and(|rank| cards.iter().all(|c| c.rank == rank))
    }

    /// The defender holds the trump card of the table's shared rank
    /// without playing it.
    pub fn is_legal_pass_on_using_trump(&self) -> bool {
        let (Some(trump), Some(defender_seat)) = (self.trump, self.defender_seat_opt()) else {
            return false;
        };
        self.table.common_bottom_rank().is_some_and(|rank| {
            self.players[defender_seat].has_card(Card::new(trump, rank))
        })
    }

    /// Defender redirects the unbroken table to the next seat using own
    /// same-rank cards. An ill-ranked pass is absorbed as a
    /// `PassIllegalCards` cheat under the same terms as illegal throws.
    pub fn pass_on(&mut self, username: &str, cards: &[Card]) -> Result<PassOutcome, DomainError> {
        self.require_in_progress()?;
        let defender_seat = self.require_defender(username)?;
        if cards.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::NoCards,
                "no cards passed",
            ));
        }
        self.require_held(defender_seat, cards)?;
        self.require_possible_pass(cards)?;

        let mut cheat_recorded = false;
        if !self.is_legal_pass_on(cards) {
            self.record_cheat(
                username,
                CheatKind::PassIllegalCards {
                    cards: cards.to_vec(),
                },
            )?;
            cheat_recorded = true;
        }

        self.players[defender_seat].remove_cards(cards)?;
        for card in cards {
            self.table.throw(*card);
        }
        let outcome = self.advance_defender_for_pass(defender_seat);
        debug!(
            game_id = self.id,
            player = username,
            new_defender = outcome.as_str(),
            cheat = cheat_recorded,
            "passed on"
        );
        Ok(PassOutcome {
            cheat_recorded,
            new_defender: outcome,
        })
    }

    /// Pass on by asserting possession of the trump card of the table's
    /// rank. Nothing moves, so an illegal declaration has no cheat path
    /// and is refused.
    pub fn pass_on_using_trump(&mut self, username: &str) -> Result<PassOutcome, DomainError> {
        self.require_in_progress()?;
        let defender_seat = self.require_defender(username)?;
        self.require_possible_pass(&[])?;
        if !self.is_legal_pass_on_using_trump() {
            return Err(DomainError::validation(
                ValidationKind::IllegalPass,
                "defender does not hold the trump of the table's rank",
            ));
        }
        let new_defender = self.advance_defender_for_pass(defender_seat);
        debug!(
            game_id = self.id,
            player = username,
            new_defender = new_defender.as_str(),
            "passed on with trump"
        );
        Ok(PassOutcome {
            cheat_recorded: false,
            new_defender,
        })
    }

    fn require_possible_pass(&self, cards: &[Card]) -> Result<(), DomainError> {
        if self.table.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::TableEmpty,
                "nothing to pass on",
            ));
        }
        if !self.table.all_open() {
            return Err(DomainError::validation(
                ValidationKind::TableBroken,
                "cannot pass once cards are broken",
            ));
        }
        if !self.is_possible_pass_on(cards) {
            return Err(DomainError::validation(
                ValidationKind::DefenderOverloaded,
                "next defender cannot cover the table",
            ));
        }
        Ok(())
    }

    /// The defender role moves one seat on; the round continues without a
    /// redeal, so only the neighbor grants reset.
    fn advance_defender_for_pass(&mut self, defender_seat: usize) -> String {
        let next = (defender_seat + 1) % self.players.len();
        let new_defender = self.players[next].username().to_string();
        self.defender = Some(new_defender.clone());
        self.next_allows_break = false;
        self.prev_allows_break = false;
        new_defender
    }

    // Cheats ---------------------------------------------------------------

    /// Swap an own card for the face-up trump card at the deck bottom.
    pub fn steal_trump_card(&mut self, username: &str, card: Card) -> Result<(), DomainError> {
        self.require_in_progress()?;
        let seat = self.seated_index(username)?;
        let trump_card = self.trump_card.ok_or_else(|| {
            DomainError::validation(ValidationKind::PhaseMismatch, "no trump card revealed")
        })?;
        if self.deck.bottom() != Some(trump_card) {
            return Err(DomainError::validation(
                ValidationKind::EmptyDeck,
                "the trump card has already been drawn",
            ));
        }
        if !self.players[seat].has_card(card) {
            return Err(DomainError::validation(
                ValidationKind::CardNotHeld,
                format!("{username} does not hold {card}"),
            ));
        }
        self.ensure_no_active_cheat(username)?;

        self.players[seat].remove_cards(&[card])?;
        self.deck.remove_cards(&[trump_card]);
        self.deck.add_to_bottom(card);
        self.players[seat].add_card(trump_card);
        self.trump_card = Some(card);
        self.insert_cheat(
            username,
            CheatKind::StealTrumpCard {
                original_trump: trump_card,
                swapped: card,
            },
        );
        Ok(())
    }

    /// Stuff own cards back into the deck, on top.
    pub fn put_into_deck(&mut self, username: &str, cards: &[Card]) -> Result<(), DomainError> {
        self.require_in_progress()?;
        let seat = self.seated_index(username)?;
        if cards.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::NoCards,
                "no cards to put into the deck",
            ));
        }
        self.require_held(seat, cards)?;
        self.ensure_no_active_cheat(username)?;

        self.players[seat].remove_cards(cards)?;
        self.deck.insert_at_top(cards);
        self.insert_cheat(
            username,
            CheatKind::PutIntoDeck {
                cards: cards.to_vec(),
            },
        );
        Ok(())
    }

    /// Name a cheating player. Within the window the recorded effect is
    /// undone; an innocent or expired target is a harmless no-op. Callers
    /// themselves are throttled to one call-out per cheat window. A cheat
    /// whose effect cannot be undone right now stays on the ledger and
    /// costs the caller nothing.
    pub fn call_out_cheat(
        &mut self,
        caller: &str,
        accused: &str,
    ) -> Result<CallOutOutcome, DomainError> {
        self.require_in_progress()?;
        self.seated_index(caller)?;
        self.seated_index(accused)?;
        if caller == accused {
            return Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                "cannot call out yourself",
            ));
        }
        let now = Instant::now();
        if let Some(last) = self.last_call_out.get(caller) {
            if now < *last + super::cheat::CHEAT_WINDOW {
                return Err(DomainError::conflict(
                    ConflictKind::CallOutThrottled,
                    format!("{caller} called out too recently"),
                ));
            }
        }

        match self.cheats.remove(accused) {
            None => {
                self.last_call_out.insert(caller.to_string(), now);
                Ok(CallOutOutcome { rolled_back: false })
            }
            Some(cheat) if cheat.is_expired(now) => {
                self.last_call_out.insert(caller.to_string(), now);
                Ok(CallOutOutcome { rolled_back: false })
            }
            Some(cheat) => {
                if self.rollback_cheat(accused, cheat.kind().clone()) {
                    info!(
                        game_id = self.id,
                        caller,
                        accused,
                        "cheat called out, rolled back"
                    );
                    self.last_call_out.insert(caller.to_string(), now);
                    Ok(CallOutOutcome { rolled_back: true })
                } else {
                    // Nothing was undone: the record stays live and the
                    // caller keeps their call-out.
                    self.cheats.insert(accused.to_string(), cheat);
                    Ok(CallOutOutcome { rolled_back: false })
                }
            }
        }
    }

    fn ensure_no_active_cheat(&self, username: &str) -> Result<(), DomainError> {
        if self.has_active_cheat(username) {
            return Err(DomainError::conflict(
                ConflictKind::CheatOutstanding,
                format!("{username} already has an open cheat"),
            ));
        }
        Ok(())
    }

    fn insert_cheat(&mut self, username: &str, kind: CheatKind) {
        warn!(game_id = self.id, player = username, kind = ?kind, "cheat recorded");
        self.cheats
            .insert(username.to_string(), Cheat::new(username, kind, Instant::now()));
    }

    fn record_cheat(&mut self, username: &str, kind: CheatKind) -> Result<(), DomainError> {
        self.ensure_no_active_cheat(username)?;
        self.insert_cheat(username, kind);
        Ok(())
    }

    /// Undo a cheat's side effects, reporting whether anything was undone.
    /// The accused is still seated: the ledger is cleared at every round
    /// end, so records never outlive the round that produced them.
    fn rollback_cheat(&mut self, accused: &str, kind: CheatKind) -> bool {
        match kind {
            CheatKind::ThrowIllegalCards { cards } => {
                self.rollback_table_cards(accused, &cards);
                true
            }
            CheatKind::PassIllegalCards { cards } => {
                self.rollback_table_cards(accused, &cards);
                // The pass also moved the defender role; hand it back.
                self.defender = Some(accused.to_string());
                self.next_allows_break = false;
                self.prev_allows_break = false;
                true
            }
            CheatKind::StealTrumpCard {
                original_trump,
                swapped,
            } => {
                let Some(seat) = self.seat_of(accused) else {
                    return false;
                };
                if !self.players[seat].has_card(original_trump) {
                    // The stolen card already moved on; nothing to swap back.
                    warn!(
                        game_id = self.id,
                        player = accused,
                        "stolen trump no longer in hand, rollback skipped"
                    );
                    return false;
                }
                let _ = self.players[seat].remove_cards(&[original_trump]);
                self.deck.remove_cards(&[swapped]);
                self.deck.add_to_bottom(original_trump);
                self.players[seat].add_card(swapped);
                self.trump_card = Some(original_trump);
                true
            }
            CheatKind::PutIntoDeck { cards } => {
                self.deck.remove_cards(&cards);
                if let Some(seat) = self.seat_of(accused) {
                    self.players[seat].add_cards(&cards);
                }
                true
            }
        }
    }

    /// Strip the named bottoms off the table back into the accused's hand;
    /// tops that sat on them were played by the defender and return there.
    fn rollback_table_cards(&mut self, accused: &str, cards: &[Card]) {
        let (removed, orphaned_tops) = self.table.remove_bottoms(cards);
        if let Some(seat) = self.seat_of(accused) {
            self.players[seat].add_cards(&removed);
        }
        if !orphaned_tops.is_empty() {
            if let Some(defender_seat) = self.defender_seat_opt() {
                self.players[defender_seat].add_cards(&orphaned_tops);
            }
        }
    }

    // Round lifecycle ------------------------------------------------------

    /// Clear the table, top hands back up while the deck lasts, retire
    /// emptied seats once it is out, and rotate the defender role.
    fn finish_round(&mut self, has_broken: bool) -> Result<RoundOutcome, DomainError> {
        let old_defender_seat = self.defender_seat()?;
        // Seating as it stands now; retirement below must not disturb the
        // rotation arithmetic.
        let seating: Vec<String> = self
            .players
            .iter()
            .map(|p| p.username().to_string())
            .collect();

        self.table.clear();

        if !self.deck.is_empty() {
            let n = self.players.len();
            for offset in 0..n {
                let seat = (old_defender_seat + offset) % n;
                while self.players[seat].card_count() < self.cards_per_player
                    && !self.deck.is_empty()
                {
                    let card = self.deck.draw()?;
                    self.players[seat].add_card(card);
                }
            }
        }

        if self.deck.is_empty() {
            let (finished, active): (Vec<Player>, Vec<Player>) = self
                .players
                .drain(..)
                .partition(|p| p.card_count() == 0);
            for player in &finished {
                info!(
                    game_id = self.id,
                    player = player.username(),
                    "player finished, back to lobby"
                );
            }
            self.lobby.extend(finished);
            self.players = active;
        }

        if self.players.len() <= 1 {
            for mut player in self.players.drain(..) {
                player.clear_hand();
                self.lobby.push(player);
            }
            self.in_progress = false;
            self.defender = None;
            self.trump = None;
            self.trump_card = None;
            self.reset_round_state();
            info!(game_id = self.id, "game finished");
            return Ok(RoundOutcome {
                game_over: true,
                next_defender: None,
            });
        }

        // Advance over surviving seats: one hop after a break, two after a
        // take (the old defender skips a turn as defender-designate).
        let hops = if has_broken { 1 } else { 2 };
        let n = seating.len();
        let mut remaining = hops;
        let mut next_defender = None;
        for step in 1..=n * 2 {
            let name = &seating[(old_defender_seat + step) % n];
            if self.players.iter().any(|p| p.username() == name) {
                remaining -= 1;
                if remaining == 0 {
                    next_defender = Some(name.clone());
                    break;
                }
            }
        }
        self.defender = next_defender.clone();
        self.reset_round_state();
        debug!(
            game_id = self.id,
            defender = next_defender.as_deref().unwrap_or(""),
            has_broken,
            "round finished"
        );
        Ok(RoundOutcome {
            game_over: false,
            next_defender,
        })
    }

    fn reset_round_state(&mut self) {
        self.next_allows_break = false;
        self.prev_allows_break = false;
        self.throwing_started = false;
        self.cheats.clear();
        self.last_call_out.clear();
        self.last_activity = Instant::now();
    }

    // Seat math ------------------------------------------------------------

    fn seat_of(&self, username: &str) -> Option<usize> {
        self.players.iter().position(|p| p.username() == username)
    }

    fn seated_index(&self, username: &str) -> Result<usize, DomainError> {
        self.seat_of(username).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Player, format!("{username} is not seated"))
        })
    }

    fn defender_seat_opt(&self) -> Option<usize> {
        self.defender.as_deref().and_then(|name| self.seat_of(name))
    }

    fn defender_seat(&self) -> Result<usize, DomainError> {
        self.defender_seat_opt().ok_or_else(|| {
            DomainError::validation(ValidationKind::PhaseMismatch, "no round in progress")
        })
    }

    fn require_defender(&self, username: &str) -> Result<usize, DomainError> {
        let defender_seat = self.defender_seat()?;
        if self.players[defender_seat].username() != username {
            return Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                format!("{username} is not the defender"),
            ));
        }
        Ok(defender_seat)
    }

    fn require_in_progress(&self) -> Result<(), DomainError> {
        if !self.in_progress {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "game is not in progress",
            ));
        }
        Ok(())
    }

    /// Counting duplicates in the request, so a doubled token cannot slip
    /// past into the mutation phase.
    fn require_held(&self, seat: usize, cards: &[Card]) -> Result<(), DomainError> {
        let player = &self.players[seat];
        for (i, card) in cards.iter().enumerate() {
            let wanted = cards[..=i].iter().filter(|c| *c == card).count();
            let held = player.hand().iter().filter(|c| *c == card).count();
            if wanted > held {
                return Err(DomainError::validation(
                    ValidationKind::CardNotHeld,
                    format!("{} does not hold {card}", player.username()),
                ));
            }
        }
        Ok(())
    }
}

// Test-only seams for assembling mid-round positions directly.
#[cfg(test)]
impl DurakGame {
    /// Seat the named players in order, mid-game, with empty hands and an
    /// empty deck. The second seat defends; adjust afterwards as needed.
    pub(crate) fn setup_round_for_tests(
        &mut self,
        usernames: &[&str],
        trump: Suit,
        cards_per_player: usize,
    ) {
        self.players = usernames.iter().map(|u| Player::new(*u)).collect();
        self.lobby.clear();
        self.deck = Deck::empty();
        self.trump = Some(trump);
        self.trump_card = None;
        self.cards_per_player = cards_per_player;
        self.defender = Some(usernames[1].to_string());
        self.in_progress = true;
        self.table = Table::new();
        self.reset_round_state();
    }

    pub(crate) fn set_deck_for_tests(&mut self, cards: Vec<Card>) {
        self.deck.set_cards_for_tests(cards);
    }

    pub(crate) fn set_trump_card_for_tests(&mut self, card: Option<Card>) {
        self.trump_card = card;
    }

    pub(crate) fn set_hand_for_tests(&mut self, username: &str, cards: Vec<Card>) {
        let player = self
            .players
            .iter_mut()
            .chain(self.lobby.iter_mut())
            .find(|p| p.username() == username)
            .expect("player exists");
        player.clear_hand();
        player.add_cards(&cards);
    }

    pub(crate) fn table_mut_for_tests(&mut self) -> &mut Table {
        &mut self.table
    }

    pub(crate) fn insert_cheat_for_tests(&mut self, cheat: Cheat) {
        self.cheats.insert(cheat.player().to_string(), cheat);
    }

    /// Total cards across hands, deck, and table (conservation checks).
    pub(crate) fn total_cards_for_tests(&self) -> usize {
        let hands: usize = self.players.iter().map(|p| p.card_count()).sum();
        hands + self.deck.len() + self.table.card_count()
    }
}
