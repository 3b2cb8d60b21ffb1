//! Create a card at the end of a list.

use anyhow::{anyhow, Result};
use board_client::{BoardClient, RemoteGateway};
use board_types::CardId;

use super::{locate_card, resolve_list, settle};

/// Run the add command. Returns the server-issued id of the new card.
pub async fn run<G: RemoteGateway + 'static>(client: &BoardClient<G>, list: &str, title: &str) -> Result<CardId> {
    let list_id = resolve_list(&client.board(), list)?;

    let in_flight = client.create_card(&list_id, title)?;
    let (_, index) = locate_card(&client.board(), in_flight.card_id())?;
    settle(in_flight).await?;

    // The stored card takes the temporary card's slot.
    let board = client.board();
    let card = board
        .list(&list_id)
        .and_then(|list| list.cards.get(index))
        .ok_or_else(|| anyhow!("created card vanished from {list_id}"))?;

    println!("Created {} in {} (order {})", card.id, list_id, card.sort_order);
    Ok(card.id.clone())
}
