//! Authoritative rules engine for multiplayer Durak with deliberate
//! cheating moves and a call-out window to punish them.
//!
//! The crate is transport-agnostic: [`domain`] holds the rules,
//! [`registry`] hands out shared game handles for whatever server sits on
//! top.

#![deny(clippy::wildcard_imports)]

pub mod domain;
pub mod errors;
pub mod registry;


pub use domain::{DurakGame, GameId, GameSnapshot, PrivateSnapshot};
pub use errors::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
pub use registry::{GameRegistry, SharedGame};

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
