//! Remote record shapes exchanged with the storage gateway.
//!
//! Field names follow the backing tables (`lists`, `cards`) in snake_case, so
//! these types serialize directly to and from the REST representation.

use serde::{Deserialize, Serialize};

use crate::{CardId, ListId};

/// A row of the `lists` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecord {
    /// Server-issued id
    pub id: ListId,
    /// Display title
    pub title: String,
    /// Sort key of the list
    pub sort_order: f64,
    /// Creation timestamp as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A row of the `cards` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Server-issued id
    pub id: CardId,
    /// Display title
    pub title: String,
    /// Owning list
    pub list_id: ListId,
    /// Sort key within the owning list
    pub sort_order: f64,
    /// Creation timestamp as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Insert payload for a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewList {
    /// Display title
    pub title: String,
    /// Sort key of the list
    pub sort_order: f64,
}

/// Insert payload for a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    /// Display title
    pub title: String,
    /// Owning list
    pub list_id: ListId,
    /// Sort key within the owning list
    pub sort_order: f64,
}

/// Partial update of a card row. Only present fields are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardUpdate {
    /// Row to update
    pub id: CardId,
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New owning list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<ListId>,
    /// New sort key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<f64>,
}

impl CardUpdate {
    /// An update that only renames the card.
    pub fn title(id: CardId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            list_id: None,
            sort_order: None,
        }
    }

    /// An update that relocates the card.
    pub fn placement(id: CardId, list_id: ListId, sort_order: f64) -> Self {
        Self {
            id,
            title: None,
            list_id: Some(list_id),
            sort_order: Some(sort_order),
        }
    }

    /// Apply the present fields to a stored row.
    pub fn apply_to(&self, record: &mut CardRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(list_id) = &self.list_id {
            record.list_id = list_id.clone();
        }
        if let Some(sort_order) = self.sort_order {
            record.sort_order = sort_order;
        }
    }
}
