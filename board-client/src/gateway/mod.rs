//! Remote storage seam for the board.
//!
//! The orchestrator never talks to a database directly; every remote read
//! and write goes through [`RemoteGateway`]. Implementations:
//!
//! - [`MockGateway`]: in-memory tables with failure injection, for tests
//! - [`HttpGateway`]: a PostgREST backend (`lists` and `cards` tables)
//!
//! # Design
//!
//! The trait is async and row-oriented:
//! - `load_*` return whole tables ordered by `sort_order` ascending
//! - `create_*` and `update_card` return the stored row, or `None` when the
//!   backend answered without one
//! - `delete_card` returns nothing on success
//!
//! # Example
//!
//! ```ignore
//! let gateway = MockGateway::new();
//! let list = gateway.seed_list("To Do", 1000.0);
//! let card = gateway.create_card(NewCard { .. }).await?;
//! ```

mod http;
mod mock;

pub use http::HttpGateway;
pub use mock::{GatewayCall, MockGateway};

use std::fmt;

use async_trait::async_trait;
use board_types::{CardId, CardRecord, CardUpdate, GatewayError, ListRecord, NewCard, NewList};

/// The six remote operations, used to address failure injection and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    /// `load_lists`
    LoadLists,
    /// `load_cards`
    LoadCards,
    /// `create_list`
    CreateList,
    /// `create_card`
    CreateCard,
    /// `update_card`
    UpdateCard,
    /// `delete_card`
    DeleteCard,
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GatewayOp::LoadLists => "load_lists",
            GatewayOp::LoadCards => "load_cards",
            GatewayOp::CreateList => "create_list",
            GatewayOp::CreateCard => "create_card",
            GatewayOp::UpdateCard => "update_card",
            GatewayOp::DeleteCard => "delete_card",
        };
        f.write_str(name)
    }
}

/// Remote persistent store for lists and cards.
///
/// Implementations must be shareable across tasks: the orchestrator issues
/// calls from spawned tasks and several may be in flight at once.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// All lists, ascending by `sort_order`.
    async fn load_lists(&self) -> Result<Vec<ListRecord>, GatewayError>;

    /// All cards, ascending by `sort_order`.
    async fn load_cards(&self) -> Result<Vec<CardRecord>, GatewayError>;

    /// Insert a list and return the stored row.
    async fn create_list(&self, list: NewList) -> Result<Option<ListRecord>, GatewayError>;

    /// Insert a card and return the stored row.
    ///
    /// `None` means the backend accepted the request but returned no row;
    /// the orchestrator treats that as a failure.
    async fn create_card(&self, card: NewCard) -> Result<Option<CardRecord>, GatewayError>;

    /// Apply a partial update and return the stored row, if any.
    async fn update_card(&self, update: CardUpdate) -> Result<Option<CardRecord>, GatewayError>;

    /// Delete a card row.
    async fn delete_card(&self, card_id: &CardId) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: RemoteGateway + ?Sized> RemoteGateway for std::sync::Arc<G> {
    async fn load_lists(&self) -> Result<Vec<ListRecord>, GatewayError> {
        (**self).load_lists().await
    }

    async fn load_cards(&self) -> Result<Vec<CardRecord>, GatewayError> {
        (**self).load_cards().await
    }

    async fn create_list(&self, list: NewList) -> Result<Option<ListRecord>, GatewayError> {
        (**self).create_list(list).await
    }

    async fn create_card(&self, card: NewCard) -> Result<Option<CardRecord>, GatewayError> {
        (**self).create_card(card).await
    }

    async fn update_card(&self, update: CardUpdate) -> Result<Option<CardRecord>, GatewayError> {
        (**self).update_card(update).await
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<(), GatewayError> {
        (**self).delete_card(card_id).await
    }
}
