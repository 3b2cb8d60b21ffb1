//! CLI command implementations.
//!
//! Each command takes an activated [`board_client::BoardClient`] so it can be exercised
//! against [`board_client::MockGateway`] in tests.

pub mod add;
pub mod edit;
pub mod init;
pub mod mv;
pub mod rm;
pub mod show;

use anyhow::{anyhow, bail, Result};
use board_client::InFlight;
use board_core::{Board, Outcome};
use board_types::{CardId, ListId};

/// Resolve a list given by id or by title (case-insensitive).
pub fn resolve_list(board: &Board, needle: &str) -> Result<ListId> {
    board
        .lists()
        .iter()
        .find(|list| list.id.as_str() == needle)
        .or_else(|| {
            board
                .lists()
                .iter()
                .find(|list| list.title.eq_ignore_ascii_case(needle))
        })
        .map(|list| list.id.clone())
        .ok_or_else(|| anyhow!("no list with id or title '{needle}'"))
}

/// Find a card by id: its list and index.
pub fn locate_card(board: &Board, card_id: &CardId) -> Result<(ListId, usize)> {
    board
        .find_card(card_id)
        .map(|(list_id, index, _)| (list_id.clone(), index))
        .ok_or_else(|| anyhow!("no card with id '{card_id}'"))
}

/// Wait for a remote call and turn a failed settlement into an error.
pub async fn settle(in_flight: InFlight) -> Result<()> {
    let card_id = in_flight.card_id().clone();
    match in_flight.settled().await? {
        Outcome::Success => Ok(()),
        Outcome::Failure(err) => bail!("remote store rejected the change to {card_id}: {err}"),
    }
}
