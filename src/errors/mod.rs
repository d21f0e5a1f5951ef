//! Error handling for the durak engine.

pub mod domain;

pub use domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
