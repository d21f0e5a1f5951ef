//! Domain-level error type used across the engine and registry.
//!
//! Every refused action is expressed as an `Err(DomainError)` and leaves
//! game state untouched. The transport layer relays the refusal to the
//! acting player; nothing in here is fatal.

use thiserror::Error;

/// Validation kinds: structurally impossible or hard-rejected actions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    /// Action does not apply in the current game phase.
    PhaseMismatch,
    /// Actor is not the seat allowed to perform this action.
    OutOfTurn,
    /// A referenced card is not in the expected hand.
    CardNotHeld,
    /// A referenced card is not on the table where expected.
    CardNotOnTable,
    /// The targeted bottom card already carries a top card.
    CardAlreadyBroken,
    /// The defender cannot cover that many cards.
    DefenderOverloaded,
    /// Thrown cards do not share one rank on the first throw.
    RankMismatch,
    /// Neighbor permissions for a full break are missing.
    BreakNotAllowed,
    /// Full-break declaration does not beat every bottom card.
    IllegalBreak,
    /// Pass declaration fails the shared-rank or trump-possession rule.
    IllegalPass,
    /// The table holds no cards.
    TableEmpty,
    /// The table already holds broken (covered) cards.
    TableBroken,
    /// The deck holds no cards.
    EmptyDeck,
    /// Deck capacity cannot cover the seated players.
    NotEnoughCards,
    /// Too few seated players to start.
    NotEnoughPlayers,
    /// Card token could not be parsed.
    ParseCard,
    /// An action was invoked with an empty card list.
    NoCards,
}

/// Conflict kinds: the action collides with an outstanding state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    /// The actor already has an unexpired cheat on the ledger.
    CheatOutstanding,
    /// The caller called out a cheat too recently.
    CallOutThrottled,
}

/// Not-found kinds: the referenced entity does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Game,
    Player,
}

/// Central domain error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Input validation or rule violation without a cheat path.
    #[error("validation {0:?}: {1}")]
    Validation(ValidationKind, String),
    /// Semantic conflict with outstanding state.
    #[error("conflict {0:?}: {1}")]
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms.
    #[error("not found {0:?}: {1}")]
    NotFound(NotFoundKind, String),
}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }

    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }

    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }

    /// Validation kind, if this is a validation error.
    pub fn validation_kind(&self) -> Option<&ValidationKind> {
        match self {
            Self::Validation(kind, _) => Some(kind),
            _ => None,
        }
    }
}
