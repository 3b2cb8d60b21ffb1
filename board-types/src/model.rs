//! Client-side board entities.
//!
//! These are the shapes the board is rendered from. They differ from the
//! remote records in [`crate::records`]: a [`Card`] does not carry its list
//! id because ownership is expressed by which [`List`] holds it.

use serde::{Deserialize, Serialize};

use crate::{CardId, CardRecord, ListId, ListRecord};

/// A card as held on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Card identity (temporary until the server confirms creation).
    pub id: CardId,
    /// Display title.
    pub title: String,
    /// Fractional sort key; ascending within the owning list.
    pub sort_order: f64,
}

impl Card {
    /// Create a card.
    pub fn new(id: CardId, title: impl Into<String>, sort_order: f64) -> Self {
        Self {
            id,
            title: title.into(),
            sort_order,
        }
    }
}

impl From<CardRecord> for Card {
    fn from(record: CardRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            sort_order: record.sort_order,
        }
    }
}

/// A list (column) with its cards in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// List identity.
    pub id: ListId,
    /// Display title.
    pub title: String,
    /// Cards, ordered by ascending `sort_order`.
    pub cards: Vec<Card>,
    /// Sort key of the list itself.
    pub sort_order: f64,
}

impl List {
    /// Create an empty list.
    pub fn new(id: ListId, title: impl Into<String>, sort_order: f64) -> Self {
        Self {
            id,
            title: title.into(),
            cards: Vec::new(),
            sort_order,
        }
    }

    /// Builder-style helper to attach cards.
    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards;
        self
    }

    /// Position of a card in this list.
    pub fn position(&self, card_id: &CardId) -> Option<usize> {
        self.cards.iter().position(|card| &card.id == card_id)
    }

    /// The last card, if any.
    pub fn last_card(&self) -> Option<&Card> {
        self.cards.last()
    }
}

impl From<ListRecord> for List {
    fn from(record: ListRecord) -> Self {
        Self::new(record.id, record.title, record.sort_order)
    }
}

/// Partial update applied to a card on the board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardPatch {
    /// New title, if changed.
    pub title: Option<String>,
    /// New sort key, if changed.
    pub sort_order: Option<f64>,
}

impl CardPatch {
    /// Patch that only changes the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            sort_order: None,
        }
    }

    /// Patch that only changes the sort key.
    pub fn sort_order(sort_order: f64) -> Self {
        Self {
            title: None,
            sort_order: Some(sort_order),
        }
    }

    /// Merge this patch into a card.
    pub fn apply_to(&self, card: &Card) -> Card {
        Card {
            id: card.id.clone(),
            title: self.title.clone().unwrap_or_else(|| card.title.clone()),
            sort_order: self.sort_order.unwrap_or(card.sort_order),
        }
    }
}

impl From<&CardRecord> for CardPatch {
    fn from(record: &CardRecord) -> Self {
        Self {
            title: Some(record.title.clone()),
            sort_order: Some(record.sort_order),
        }
    }
}
