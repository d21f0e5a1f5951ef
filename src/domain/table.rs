//! Table state: an ordered mapping from bottom (attacking) cards to the
//! top cards covering them. An entry without a top card is "open".

use super::cards::{Card, Rank};
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TableEntry {
    pub bottom: Card,
    pub top: Option<Card>,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<TableEntry>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bottoms and present tops both count.
    pub fn card_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| if e.top.is_some() { 2 } else { 1 })
            .sum()
    }

    pub fn unbroken_count(&self) -> usize {
        self.entries.iter().filter(|e| e.top.is_none()).count()
    }

    pub fn all_open(&self) -> bool {
        self.entries.iter().all(|e| e.top.is_none())
    }

    pub fn all_broken(&self) -> bool {
        self.entries.iter().all(|e| e.top.is_some())
    }

    pub fn is_open(&self, bottom: Card) -> bool {
        self.entries
            .iter()
            .any(|e| e.bottom == bottom && e.top.is_none())
    }

    /// Whether the rank appears anywhere on the table, bottom or top.
    pub fn has_rank(&self, rank: Rank) -> bool {
        self.entries.iter().any(|e| {
            e.bottom.rank == rank || e.top.is_some_and(|t| t.rank == rank)
        })
    }

    /// The single rank shared by every bottom card, if there is one.
    pub fn common_bottom_rank(&self) -> Option<Rank> {
        let first = self.entries.first()?.bottom.rank;
        self.entries
            .iter()
            .all(|e| e.bottom.rank == first)
            .then_some(first)
    }

    /// Lay a card down as a new open entry.
    pub fn throw(&mut self, bottom: Card) {
        self.entries.push(TableEntry { bottom, top: None });
    }

    /// Cover an open bottom card. A broken entry is never overwritten.
    pub fn break_entry(&mut self, bottom: Card, top: Card) -> Result<(), DomainError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.bottom == bottom)
            .ok_or_else(|| {
                DomainError::validation(
                    ValidationKind::CardNotOnTable,
                    format!("{bottom} is not on the table"),
                )
            })?;
        if entry.top.is_some() {
            return Err(DomainError::validation(
                ValidationKind::CardAlreadyBroken,
                format!("{bottom} is already broken"),
            ));
        }
        entry.top = Some(top);
        Ok(())
    }

    /// Re-parent an already-placed top card onto a different open bottom.
    pub fn move_top(&mut self, top: Card, new_bottom: Card) -> Result<(), DomainError> {
        let from = self
            .entries
            .iter()
            .position(|e| e.top == Some(top))
            .ok_or_else(|| {
                DomainError::validation(
                    ValidationKind::CardNotOnTable,
                    format!("{top} is not a top card"),
                )
            })?;
        if !self.is_open(new_bottom) {
            return Err(DomainError::validation(
                ValidationKind::CardNotOnTable,
                format!("{new_bottom} is not an open bottom card"),
            ));
        }
        self.entries[from].top = None;
        self.break_entry(new_bottom, top)
    }

    /// Remove the entries whose bottoms are named, returning the removed
    /// bottoms and any tops that sat on them.
    pub fn remove_bottoms(&mut self, bottoms: &[Card]) -> (Vec<Card>, Vec<Card>) {
        let mut removed = Vec::new();
        let mut orphaned_tops = Vec::new();
        self.entries.retain(|e| {
            if bottoms.contains(&e.bottom) {
                removed.push(e.bottom);
                if let Some(top) = e.top {
                    orphaned_tops.push(top);
                }
                false
            } else {
                true
            }
        });
        (removed, orphaned_tops)
    }

    /// Drain every card off the table, bottoms and tops alike.
    pub fn drain_all(&mut self) -> Vec<Card> {
        let mut cards = Vec::with_capacity(self.card_count());
        for entry in self.entries.drain(..) {
            cards.push(entry.bottom);
            if let Some(top) = entry.top {
                cards.push(top);
            }
        }
        cards
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
