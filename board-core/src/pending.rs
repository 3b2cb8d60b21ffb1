//! Per-card "operation in flight" flags.
//!
//! The tracker only holds card ids; it never owns card data. A card is
//! pending while its id is present. Clearing removes the key, so idle cards
//! leave no trace.
//!
//! This is bookkeeping for the UI, not a lock: marking a card that is
//! already pending is allowed, and the first settlement to arrive clears the
//! flag even if a later call for the same card is still outstanding.

use std::collections::BTreeSet;

use board_types::CardId;
use serde::Serialize;

/// Set of card ids with a remote call outstanding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PendingTracker {
    pending: BTreeSet<CardId>,
}

impl PendingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a card as having an operation in flight. Idempotent.
    pub fn mark_pending(&mut self, card_id: CardId) {
        self.pending.insert(card_id);
    }

    /// Remove the flag for a card.
    pub fn clear_pending(&mut self, card_id: &CardId) {
        self.pending.remove(card_id);
    }

    /// Whether the card has an operation in flight.
    pub fn is_pending(&self, card_id: &CardId) -> bool {
        self.pending.contains(card_id)
    }

    /// Number of pending cards.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterate pending card ids in id order.
    pub fn iter(&self) -> impl Iterator<Item = &CardId> {
        self.pending.iter()
    }
}
