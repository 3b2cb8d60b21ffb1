//! Identity types for board entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by client-generated card ids that the server has not
/// confirmed yet.
pub const TEMP_ID_PREFIX: &str = "tmp-";

/// Identifier of a list (column) on the board.
///
/// Opaque string issued by the remote store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListId({})", self.0)
    }
}

impl From<&str> for ListId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a card.
///
/// Either issued by the remote store or, for cards whose creation has not
/// been acknowledged yet, generated locally via [`CardId::temporary`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-wide unique id for an unconfirmed card.
    ///
    /// UUID v4 with the [`TEMP_ID_PREFIX`] prefix, so temporary ids can never
    /// collide with server ids.
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4()))
    }

    /// Whether this id was generated locally and is still awaiting the server.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardId({})", self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
